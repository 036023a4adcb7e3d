//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - QFT, phase estimation and QFT arithmetic circuits",
        style("qutil").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qutil-ir      Circuit intermediate representation");
    println!("  qutil-sim     Statevector simulator");
    println!("  qutil-qasm3   OpenQASM 3 emitter");
    println!("  qutilities    QFT, QPE, adder and multiplier builders");
    println!("  qutil-cli     Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
