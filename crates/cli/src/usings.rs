use crate::{CliResult, GlobalOptions};
use slnscope_core::project::namespaces::decode_source;
use slnscope_core::usings::find_using_directives;
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct UsingRow {
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "Using")]
    using: String,
    #[tabled(rename = "Solutions")]
    solutions: String,
}

pub async fn run(options: &GlobalOptions, file: &Path) -> CliResult {
    let bytes = tokio::fs::read(file).await?;
    let text = decode_source(&bytes);
    let directives = find_using_directives(&text);
    if directives.is_empty() {
        println!("No using directives in {}.", file.display());
        return Ok(());
    }

    let service = crate::query::prepare(options).await?;
    let snapshot = service.snapshot();

    let rows: Vec<UsingRow> = directives
        .into_iter()
        .map(|directive| {
            let solutions = snapshot
                .solutions_for(&directive.namespace)
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>();
            let using = match &directive.alias {
                Some(alias) => format!("{} = {}", alias, directive.namespace),
                None => directive.namespace.clone(),
            };
            UsingRow {
                line: directive.line + 1,
                using,
                solutions: if solutions.is_empty() {
                    "-".to_string()
                } else {
                    solutions.join("\n")
                },
            }
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}
