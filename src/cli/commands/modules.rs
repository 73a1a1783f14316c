//! List decision modules command.

use anyhow::Result;
use trading_strategies::ModuleRegistry;

pub fn run() -> Result<()> {
    let registry = ModuleRegistry::new();

    println!("Available Decision Modules");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {}", info.kind);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!("  defaults: {}", info.default_params);
        println!();
    }

    println!("Configure modules with [[modules]] kind = \"<kind>\" entries.");
    Ok(())
}
