//! Company list management commands.

use console::style;

use super::helpers::open_database;
use gdreviews::config::Settings;

/// Track companies by name; names already present are left alone.
pub async fn cmd_company_add(settings: &Settings, names: &[String]) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let repo = ctx.companies();

    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if repo.add_name(name).await? {
            println!("  {} Added {}", style("✓").green(), name);
        } else {
            println!("  {} {} is already tracked", style("-").dim(), name);
        }
    }

    Ok(())
}

/// Print every tracked company.
pub async fn cmd_company_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let companies = ctx.companies().list().await?;

    if companies.is_empty() {
        println!("No companies tracked. Add some with 'gdreviews company add <name>'");
        return Ok(());
    }

    println!(
        "{:<10} {:<40} {:<8} {:<20}",
        "Employer", "Name", "Rating", "Last scraped"
    );
    println!("{}", "-".repeat(80));

    for company in companies {
        let employer = match (company.employer_id, company.id_not_found) {
            (Some(id), _) => id.to_string(),
            (None, true) => style("missing").red().to_string(),
            (None, false) => style("pending").yellow().to_string(),
        };
        let rating = company
            .overview
            .as_ref()
            .and_then(|o| o.overall_rating)
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        let last_scraped = company
            .last_scraped
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "{:<10} {:<40} {:<8} {:<20}",
            employer,
            truncate(&company.employer_name, 40),
            rating,
            last_scraped
        );
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}
