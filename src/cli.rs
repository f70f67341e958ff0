use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use staff_import::model::CertificationCode;

pub const DEFAULT_DATA_ROOT: &str = ".cache/staff-import";
pub const DEFAULT_DB_FILENAME: &str = "staff_roster.sqlite";

#[derive(Parser, Debug)]
#[command(
    name = "staff-import",
    version,
    about = "Bulk staff roster import with name resolution and duplicate checks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Preview(PreviewArgs),
    Commit(CommitArgs),
    Status(StatusArgs),
    Clear(ClearArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, default_value = DEFAULT_DATA_ROOT)]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long = "org")]
    pub organization_id: String,
}

impl StoreArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_root.join(DEFAULT_DB_FILENAME))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CertArg {
    Acls,
    Bls,
    Pals,
}

impl From<CertArg> for CertificationCode {
    fn from(value: CertArg) -> Self {
        match value {
            CertArg::Acls => Self::Acls,
            CertArg::Bls => Self::Bls,
            CertArg::Pals => Self::Pals,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = "-")]
    pub paste_file: PathBuf,

    #[arg(long = "cert", value_enum)]
    pub certs: Vec<CertArg>,

    #[arg(long, default_value_t = false)]
    pub all_certs: bool,

    #[arg(long)]
    pub decisions_file: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl PreviewArgs {
    pub fn reads_stdin(&self) -> bool {
        self.paste_file == Path::new("-")
    }
}

#[derive(Args, Debug, Clone)]
pub struct CommitArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub rows_file: PathBuf,

    #[arg(long)]
    pub duplicate_decisions_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value_t = false)]
    pub details: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value_t = false)]
    pub yes: bool,
}
