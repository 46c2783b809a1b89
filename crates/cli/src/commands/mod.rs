pub mod cat;
pub mod init;
pub mod list;
pub mod mkdir;
pub mod put;
pub mod remove;
pub mod stat;
pub mod transfer;
pub mod visibility;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Write a config file describing the adapter to use
    Init(init::InitArgs),
    /// List the contents of a directory
    Ls(list::ListArgs),
    /// Print a file to stdout
    Cat(cat::CatArgs),
    /// Upload a local file (or stdin)
    Put(put::PutArgs),
    /// Delete a file or, with --recursive, a directory
    Rm(remove::RemoveArgs),
    /// Create a directory
    Mkdir(mkdir::MkdirArgs),
    /// Copy a file within the store
    Cp(transfer::TransferArgs),
    /// Move a file within the store
    Mv(transfer::TransferArgs),
    /// Show metadata for a file
    Stat(stat::StatArgs),
    /// Show or change the visibility of a path
    Visibility(visibility::VisibilityArgs),
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
