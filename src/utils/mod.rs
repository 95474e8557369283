pub mod exec;
pub mod ssh;
pub mod wait;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Print a section header
pub fn banner(title: &str) {
    println!("{}", RULE);
    println!("{}", title);
    println!("{}", RULE);
    println!();
}
