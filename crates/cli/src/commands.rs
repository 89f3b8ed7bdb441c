use clap::Subcommand;
use eyre::WrapErr;
use localns_config::{ConfigLoader, PartialConfig, ServerConfig};
use localns_core::UserName;
use localns_security::{generate_key_file, load_factotum};
use localns_server::Server;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name written by `keygen`
const KEY_FILE_NAME: &str = "signing.key";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the entry for a path
    Lookup { path: String },

    /// Print the entries directly inside a directory
    List { path: String },

    /// Print the entries matching a pattern such as `ann/*/notes*`
    Glob { pattern: String },

    /// Print the entry of the policy file governing a path
    WhichAccess { path: String },

    /// Write the bytes behind a content reference to stdout
    Get {
        reference: String,

        /// Print the reference metadata as JSON instead of the bytes
        #[arg(long)]
        refdata: bool,
    },

    /// Generate a signing key in a directory
    Keygen { dir: PathBuf },
}

/// Options shared by every subcommand
#[derive(Debug, Default)]
pub struct Globals {
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub owner: Option<String>,
    pub as_user: Option<String>,
}

impl Globals {
    fn load_config(&self) -> eyre::Result<ServerConfig> {
        let mut loader = ConfigLoader::new().overrides(PartialConfig {
            root: self.root.clone(),
            owner: self.owner.clone(),
            ..PartialConfig::default()
        });
        if let Some(path) = &self.config {
            loader = loader.file(path);
        }
        Ok(loader.load()?)
    }

    fn caller(&self, config: &ServerConfig) -> eyre::Result<UserName> {
        match &self.as_user {
            Some(name) => Ok(UserName::new(name.as_str())?),
            None => Ok(config.owner.clone()),
        }
    }
}

impl Commands {
    pub fn execute(self, globals: &Globals, out: &mut dyn Write) -> eyre::Result<()> {
        tracing::debug!(command = ?self, "dispatching");
        match self {
            Commands::Keygen { dir } => keygen(&dir, out),
            Commands::Lookup { path } => {
                let (server, caller) = open(globals)?;
                print_json(out, &server.dial_dir(caller).lookup(&path)?)
            }
            Commands::List { path } => {
                let (server, caller) = open(globals)?;
                print_json(out, &server.dial_dir(caller).list_dir(&path)?)
            }
            Commands::Glob { pattern } => {
                let (server, caller) = open(globals)?;
                print_json(out, &server.dial_dir(caller).glob(&pattern)?)
            }
            Commands::WhichAccess { path } => {
                let (server, caller) = open(globals)?;
                print_json(out, &server.dial_dir(caller).which_access(&path)?)
            }
            Commands::Get { reference, refdata } => {
                let (server, caller) = open(globals)?;
                let (data, meta) = server.dial_store(caller).get(&reference)?;
                if refdata {
                    print_json(out, &meta)
                } else {
                    out.write_all(&data).wrap_err("writing content")
                }
            }
        }
    }
}

/// Load configuration and keys, and start a server for the caller
fn open(globals: &Globals) -> eyre::Result<(Server, UserName)> {
    let config = globals.load_config()?;
    let caller = globals.caller(&config)?;
    let factotum = load_factotum(config.signing_key.as_deref(), config.rotation_key.as_deref())?;
    let server = Server::new(config, Arc::new(factotum))?;
    tracing::debug!(%caller, "server ready");
    Ok((server, caller))
}

#[derive(Serialize)]
struct KeygenOutput<'a> {
    path: &'a Path,
    public_key: String,
}

fn keygen(dir: &Path, out: &mut dyn Write) -> eyre::Result<()> {
    let path = dir.join(KEY_FILE_NAME);
    let key = generate_key_file(&path)?;
    print_json(
        out,
        &KeygenOutput {
            path: &path,
            public_key: hex::encode(key.verifying_key().to_bytes()),
        },
    )
}

fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> eyre::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).wrap_err("writing JSON output")?;
    writeln!(out).wrap_err("writing JSON output")?;
    Ok(())
}
