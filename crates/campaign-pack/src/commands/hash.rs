use crate::errors::CliError;
use crate::utils::read_pack_file;
use ctk_pack::{content_hash, ContentPack};

pub struct HashPackArgs {
    pub file_path: String,
}

pub fn hash_pack(args: HashPackArgs) -> miette::Result<()> {
    let contents = read_pack_file(&args.file_path)?;
    let pack: ContentPack =
        serde_json::from_str(&contents).map_err(CliError::pack_parse_error)?;
    let hash = content_hash(&pack).map_err(CliError::pack_parse_error)?;

    println!("{}", hash);
    Ok(())
}
