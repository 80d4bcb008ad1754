//! Simple demonstration of citation strategy resolution
//!
//! This demo resolves a batch of citation tokens against an inline strategy
//! configuration and parses a generated answer for citation markers.

use citation_resolver::{CitationParser, CitationResolver, StrategyConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("📎 Citation Resolver - Demo");
    println!("===========================");

    let config: StrategyConfig = serde_json::from_str(
        r#"{
            "version": "1.0",
            "defaultStrategy": "sharepoint-hr",
            "fallbackStrategy": "file-share",
            "strategies": [
                {
                    "name": "sharepoint-hr",
                    "type": "sharepoint",
                    "baseUrl": "https://contoso.sharepoint.com/sites/hr",
                    "priority": 10,
                    "fileExtensions": [".pdf", ".docx"],
                    "authentication": {
                        "requiresAuth": true,
                        "additionalHeaders": { "X-Doc-Source": "sharepoint" }
                    }
                },
                {
                    "name": "policy-cms",
                    "type": "cms",
                    "baseUrl": "https://cms.contoso.com",
                    "priority": 5,
                    "pathPatterns": ["policies/*"]
                },
                {
                    "name": "file-share",
                    "type": "file_server",
                    "baseUrl": "https://files.contoso.com",
                    "priority": 1
                }
            ]
        }"#,
    )?;

    let report = config.validate();
    println!(
        "🔍 Configuration validated: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    let resolver = CitationResolver::default();
    let tokens = [
        "employee_handbook.pdf",
        "policies/remote-work.v2.pdf",
        "quarterly-report.xlsx",
        "org-chart.png",
    ];

    println!("\n📚 Resolving {} citations...", tokens.len());
    for token in &tokens {
        let result = resolver.resolve(token, Some(&config), None);
        let lock = if result.requires_auth { "🔒" } else { "  " };
        println!(
            "  {} {} -> {} (via {})",
            lock, token, result.url, result.strategy_used
        );
    }

    let parser = CitationParser::new()?;
    let answer = "Remote work is covered in [policies/remote-work.v2.pdf], and \
                  general conduct in [employee_handbook.pdf].";
    let sources = vec![
        "policies/remote-work.v2.pdf".to_string(),
        "employee_handbook.pdf".to_string(),
    ];

    let parsed = parser.parse(answer, &sources);
    println!("\n💬 Parsed answer: {} citations found", parsed.citations.len());
    for (i, citation) in parsed.citations.iter().enumerate() {
        println!("  [{}] {}", i + 1, citation);
    }

    println!("\n✅ Demo complete");
    Ok(())
}
