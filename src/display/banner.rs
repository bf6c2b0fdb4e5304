/// Prints the vpskit ASCII art banner
/// Displayed when the interactive menu starts on a terminal
pub fn print_banner() {
    println!(
        r#"
 __     __ ____   ____   _  __ ___  _____
 \ \   / /|  _ \ / ___| | |/ /|_ _||_   _|
  \ \ / / | |_) |\___ \ | ' /  | |   | |
   \ V /  |  __/  ___) || . \  | |   | |
    \_/   |_|    |____/ |_|\_\|___|  |_|

         server setup without the typing
"#
    );
}
