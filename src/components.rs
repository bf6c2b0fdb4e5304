use once_cell::sync::Lazy;

use crate::core::types::{ComponentKind, Verb};

/// How a managed component's live state is probed: characteristic binary,
/// optional service unit, and the arguments that coax a version string out
/// of the binary.
#[derive(Debug, Clone)]
pub struct ComponentCheck {
    pub binary: &'static str,
    pub service: Option<&'static str>,
    pub version_args: &'static [&'static str],
}

/// One manageable unit. The registry is enumerated once at startup and
/// never changes at runtime.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub kind: ComponentKind,
    pub check: Option<ComponentCheck>,
    pub verbs: &'static [Verb],
    /// Verb chosen when the user submits an empty line on this component's
    /// menu; None means empty input returns to the parent menu.
    pub default_verb: Option<Verb>,
    pub description: &'static str,
}

impl Component {
    pub fn supports(&self, verb: Verb) -> bool {
        self.verbs.contains(&verb)
    }

    pub fn is_delegate(&self) -> bool {
        self.kind == ComponentKind::Delegate
    }
}

const SERVICE_VERBS: &[Verb] = &[
    Verb::Install,
    Verb::Uninstall,
    Verb::Status,
    Verb::Configure,
    Verb::Enable,
    Verb::Disable,
];

const CONFIG_VERBS: &[Verb] = &[
    Verb::Install,
    Verb::Uninstall,
    Verb::Status,
    Verb::Configure,
];

const DELEGATE_VERBS: &[Verb] = &[Verb::Run];

/// The full component registry, grouped by menu category.
pub static REGISTRY: Lazy<Vec<Component>> = Lazy::new(|| {
    vec![
        Component {
            id: "firewall",
            name: "UFW Firewall",
            category: "Network Security",
            kind: ComponentKind::Managed,
            check: Some(ComponentCheck {
                binary: "ufw",
                service: Some("ufw"),
                version_args: &["--version"],
            }),
            verbs: SERVICE_VERBS,
            default_verb: None,
            description: "Uncomplicated Firewall - inbound traffic filtering",
        },
        Component {
            id: "intrusion-prevention",
            name: "Fail2ban",
            category: "Network Security",
            kind: ComponentKind::Managed,
            check: Some(ComponentCheck {
                binary: "fail2ban-server",
                service: Some("fail2ban"),
                version_args: &["--version"],
            }),
            verbs: SERVICE_VERBS,
            default_verb: None,
            description: "Intrusion prevention - bans IPs with repeated auth failures",
        },
        Component {
            id: "ssh-hardening",
            name: "SSH Hardening",
            category: "Access Control",
            kind: ComponentKind::Managed,
            check: Some(ComponentCheck {
                binary: "sshd",
                service: Some("ssh"),
                version_args: &["-V"],
            }),
            verbs: CONFIG_VERBS,
            default_verb: Some(Verb::Configure),
            description: "OpenSSH server lockdown (keys only, no root login)",
        },
        Component {
            id: "container-engine",
            name: "Docker Engine",
            category: "Runtime",
            kind: ComponentKind::Managed,
            check: Some(ComponentCheck {
                binary: "docker",
                service: Some("docker"),
                version_args: &["--version"],
            }),
            verbs: SERVICE_VERBS,
            default_verb: Some(Verb::Install),
            description: "Container runtime installed from the official repository",
        },
        Component {
            id: "reverse-proxy",
            name: "Nginx",
            category: "Runtime",
            kind: ComponentKind::Managed,
            check: Some(ComponentCheck {
                binary: "nginx",
                service: Some("nginx"),
                version_args: &["-v"],
            }),
            verbs: SERVICE_VERBS,
            default_verb: None,
            description: "Reverse proxy with TLS termination",
        },
        Component {
            id: "dns-resolver",
            name: "Unbound Resolver",
            category: "Runtime",
            kind: ComponentKind::Managed,
            check: Some(ComponentCheck {
                binary: "unbound",
                service: Some("unbound"),
                version_args: &["-V"],
            }),
            verbs: SERVICE_VERBS,
            default_verb: None,
            description: "Local validating DNS resolver",
        },
        Component {
            id: "traffic-report",
            name: "Traffic Report",
            category: "Diagnostics",
            kind: ComponentKind::Delegate,
            check: None,
            verbs: DELEGATE_VERBS,
            default_verb: Some(Verb::Run),
            description: "Third-party bandwidth and traffic reporter",
        },
        Component {
            id: "backup-manager",
            name: "Backup Manager",
            category: "Diagnostics",
            kind: ComponentKind::Delegate,
            check: None,
            verbs: DELEGATE_VERBS,
            default_verb: Some(Verb::Run),
            description: "Third-party backup configuration tool",
        },
        Component {
            id: "login-notifier",
            name: "Login Notifier",
            category: "Diagnostics",
            kind: ComponentKind::Delegate,
            check: None,
            verbs: DELEGATE_VERBS,
            default_verb: Some(Verb::Run),
            description: "Third-party SSH login notification setup",
        },
    ]
});

pub fn find(id: &str) -> Option<&'static Component> {
    REGISTRY.iter().find(|c| c.id == id)
}

/// Managed components, i.e. the batch-install set.
pub fn managed() -> Vec<&'static Component> {
    REGISTRY
        .iter()
        .filter(|c| c.kind == ComponentKind::Managed)
        .collect()
}

pub fn delegates() -> Vec<&'static Component> {
    REGISTRY.iter().filter(|c| c.is_delegate()).collect()
}

/// Components grouped by category, preserving registry order.
pub fn categories() -> Vec<(&'static str, Vec<&'static Component>)> {
    let mut result: Vec<(&'static str, Vec<&'static Component>)> = Vec::new();

    for component in REGISTRY.iter() {
        if let Some(existing) = result
            .iter_mut()
            .find(|(name, _)| *name == component.category)
        {
            existing.1.push(component);
        } else {
            result.push((component.category, vec![component]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_ids_are_unique() {
        let mut ids: Vec<&str> = REGISTRY.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), REGISTRY.len());
    }

    #[test]
    fn every_managed_component_accepts_core_verbs() {
        for component in managed() {
            assert!(component.supports(Verb::Install), "{}", component.id);
            assert!(component.supports(Verb::Uninstall), "{}", component.id);
            assert!(component.supports(Verb::Status), "{}", component.id);
        }
    }

    #[test]
    fn delegates_only_support_run() {
        for component in delegates() {
            assert_eq!(component.verbs, &[Verb::Run]);
            assert!(component.check.is_none());
        }
    }

    #[test]
    fn categories_preserve_registry_order() {
        let cats = categories();
        let names: Vec<&str> = cats.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["Network Security", "Access Control", "Runtime", "Diagnostics"]
        );
    }
}
