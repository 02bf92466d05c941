use crate::errors::CliError;
use crate::println_pad;
use crate::utils::read_pack_file;
use colored::Colorize;
use ctk_pack::validate_text;

pub struct ValidatePackArgs {
    pub file_path: String,
}

pub fn validate_pack(args: ValidatePackArgs) -> miette::Result<()> {
    let contents = read_pack_file(&args.file_path)?;
    let report = validate_text(&contents);

    if !report.warnings.is_empty() {
        println_pad!("{}", "⚠️ Warnings:".bright_yellow().bold());
        for warning in &report.warnings {
            println_pad!("   {} {}", "•".bright_yellow(), warning.bright_white());
        }
    }

    if !report.errors.is_empty() {
        println_pad!("{}", "❌ Errors:".bright_red().bold());
        for error in &report.errors {
            println_pad!("   {} {}", "•".bright_red(), error.bright_white());
        }
        return Err(CliError::pack_invalid(report.errors.len()).into());
    }

    println_pad!(
        "{} {}",
        "✅ Valid pack:".bright_green().bold(),
        args.file_path.bright_cyan()
    );
    Ok(())
}
