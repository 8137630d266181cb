//! The `ext` command.

use anyhow::Result;
use clap::Args;

use crate::preprocess::PreprocessorSet;

#[derive(Args, Debug)]
pub struct ExtCommand {
    /// Document path, e.g. `blog/post.md`.
    file: String,
}

impl ExtCommand {
    pub fn execute(self) -> Result<()> {
        println!("{}", PreprocessorSet::default().predicted_extension(&self.file));
        Ok(())
    }
}
