//! `parlor check`: Run the content filter on a piece of text.

use parlor_security::ContentFilter;

pub async fn run(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let filter = ContentFilter::new(&config.filter, &config.persona.platform)?;

    let report = filter.check_message(text);
    if report.is_safe() {
        println!("Safe: no disallowed content found");
        return Ok(());
    }

    println!("Unsafe:");
    for violation in report.descriptions() {
        println!("  - {violation}");
    }
    println!();
    println!("Filtered: {}", filter.filter_message(text));

    let suggestions = filter.suggest_alternatives(text);
    if !suggestions.is_empty() {
        println!();
        println!("Suggested alternatives:");
        for suggestion in suggestions {
            println!("  - {suggestion}");
        }
    }

    Ok(())
}
