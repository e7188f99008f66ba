//! The `pairdrill init` command.

use anyhow::{Context, Result};

use pairdrill_core::config::LOCAL_CONFIG;

pub fn execute() -> Result<()> {
    write_if_missing(LOCAL_CONFIG, SAMPLE_CONFIG)?;
    write_if_missing("dict.csv", SAMPLE_DECK)?;

    println!("\nNext steps:");
    println!("  1. Put your own pairs in dict.csv (column 1 = A, column 2 = B)");
    println!("  2. Run: pairdrill preview");
    println!("  3. Run: pairdrill quiz --mode fill");

    Ok(())
}

fn write_if_missing(name: &str, content: &str) -> Result<()> {
    if std::path::Path::new(name).exists() {
        println!("{name} already exists, skipping.");
    } else {
        std::fs::write(name, content).with_context(|| format!("failed to write {name}"))?;
        println!("Created {name}");
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# pairdrill configuration

# Where mistake books are stored (PAIRDRILL_DATA_DIR overrides this).
# data_dir = "/home/me/.local/share/pairdrill"

# Options per multiple-choice question (2-8).
choices = 4

# Which side is asked: "a2b", "b2a" or "random".
direction = "random"

# Question order: "random", "shuffled" or "sequential".
order = "random"

# Compare typed answers case-insensitively.
ignore_case = true
"#;

const SAMPLE_DECK: &str = "\
bonjour,你好|您好
merci,谢谢
au revoir,再见
s'il vous plaît,请
oui,是
non,不
";
