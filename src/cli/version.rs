/// Display version information
pub fn execute() {
    println!("expiring-messages {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for self-deleting chat messages");
}
