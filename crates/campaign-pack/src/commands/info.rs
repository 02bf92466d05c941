use crate::errors::CliError;
use crate::println_pad;
use crate::utils::read_pack_file;
use colored::Colorize;
use ctk_pack::{content_hash, ContentPack};

pub struct InfoPackArgs {
    pub file_path: String,
}

pub fn info_pack(args: InfoPackArgs) -> miette::Result<()> {
    let contents = read_pack_file(&args.file_path)?;
    let pack: ContentPack =
        serde_json::from_str(&contents).map_err(CliError::pack_parse_error)?;

    println_pad!(
        "{} {}",
        "📦 Pack:".bright_blue().bold(),
        pack.metadata.name.bright_cyan().bold()
    );
    println_pad!(
        "{} {}",
        "🆔 Id:".bright_green(),
        pack.metadata.id.bright_white().bold()
    );
    println_pad!(
        "{} {} {}",
        "🏷️ Version:".bright_green(),
        pack.metadata.version.bright_white().bold(),
        format!("(tool {})", pack.metadata.tool_version).dimmed()
    );
    println_pad!(
        "{} {}",
        "📜 License:".bright_yellow(),
        pack.metadata.license.bright_white()
    );
    if !pack.metadata.authors.is_empty() {
        println_pad!(
            "{} {}",
            "✍️ Authors:".bright_yellow(),
            pack.metadata.authors.join(", ").bright_white()
        );
    }

    println_pad!("\n{}", "🗂️ Contents:".bright_magenta().bold());
    println_pad!(
        "   {} {} record(s)",
        "•".bright_cyan(),
        pack.records.len().to_string().bright_white().bold()
    );
    for (content_type, ids) in &pack.allowlist {
        println_pad!(
            "   {} allowlist {} {}",
            "•".bright_cyan(),
            content_type.to_string().bright_cyan().bold(),
            format!("({} entries)", ids.len()).dimmed()
        );
    }

    if let Ok(hash) = content_hash(&pack) {
        println_pad!("\n{} {}", "🔒 SHA-256:".bright_magenta().bold(), hash.dimmed());
    }

    if let Some(notes) = &pack.notes {
        println_pad!("\n{}", "🧾 Notes:".bright_magenta().bold());
        println_pad!("{}", notes.bright_white());
    }

    Ok(())
}
