// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault Agent
//!
//! Command-line front end over [`VaultClient`]. Commands mirror the vault
//! operations: `sign-up`, `sign-in`, `read-file`, `write-file` and
//! `delete-file`.
//!
//! The session token from `sign-up`/`sign-in` is saved to a token file and
//! picked up by later commands. Records of kind `file` are written to disk
//! when read; every other kind is printed.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::client::{ClientError, VaultClient};
use crate::storage::RecordId;

/// Record kind for free-form text.
pub const KIND_TEXT: &str = "text";

/// Record kind for uploaded files, restored to disk on read.
pub const KIND_FILE: &str = "file";

/// Upload frame size used when `--chunk-size` is not given.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record name {0:?} is not a usable file name")]
    UnsafeFileName(String),

    #[error("a record name is required (--name)")]
    MissingName,

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Keeper agent - client for the personal secrets vault
#[derive(Debug, Parser)]
#[command(name = "keeper-agent", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Vault server base URL
    #[arg(long, global = true, env = "KEEPER_SERVER_ADDR", default_value = "https://127.0.0.1:8443")]
    pub server: String,

    /// PEM root certificate to trust for the server
    #[arg(long, global = true, env = "KEEPER_CA_CERT", value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Session token; overrides the token file
    #[arg(long, global = true, env = "KEEPER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Where the session token is saved and loaded
    #[arg(long, global = true, env = "KEEPER_TOKEN_FILE", default_value = ".keeper-token")]
    pub token_file: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new account
    SignUp(Credentials),

    /// Log in to an existing account
    SignIn(Credentials),

    /// List records, or read one by id
    ReadFile {
        /// Record to read; omit to list
        id: Option<RecordId>,

        /// Directory that `file` records are saved into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Store text or a file
    WriteFile(WriteArgs),

    /// Delete a record
    DeleteFile {
        /// Record to delete
        id: RecordId,
    },
}

#[derive(Debug, Args)]
pub struct Credentials {
    #[arg(long)]
    pub login: String,

    #[arg(long, env = "KEEPER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Do not save the token to the token file
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Text to store as a `text` record
    #[arg(long, required_unless_present = "file", conflicts_with = "file")]
    pub text: Option<String>,

    /// File to store as a `file` record
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Record name; defaults to the file name for `--file`
    #[arg(long)]
    pub name: Option<String>,

    /// Upload frame size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

/// Build a client for `args`, loading a saved token when none is given.
pub fn connect(args: &ConnectionArgs) -> Result<VaultClient, AgentError> {
    let mut client = match &args.ca_cert {
        Some(path) => {
            let pem = std::fs::read(path).map_err(|source| AgentError::Read {
                path: path.clone(),
                source,
            })?;
            VaultClient::with_root_ca(&args.server, &pem)?
        }
        None => VaultClient::new(&args.server)?,
    };

    match &args.token {
        Some(token) => client.set_token(token.clone()),
        None => {
            if let Some(token) = load_token(&args.token_file)? {
                client.set_token(token);
            }
        }
    }
    Ok(client)
}

/// Run one agent command, writing user-facing output to `out`.
pub async fn run(cli: Cli, out: &mut dyn Write) -> Result<(), AgentError> {
    let mut client = connect(&cli.connection)?;

    match cli.command {
        Command::SignUp(credentials) => {
            client.register(&credentials.login, &credentials.password).await?;
            writeln!(out, "Account {} created", credentials.login)?;
            keep_token(&client, &cli.connection.token_file, credentials.no_save, out)?;
        }
        Command::SignIn(credentials) => {
            client.login(&credentials.login, &credentials.password).await?;
            writeln!(out, "Signed in as {}", credentials.login)?;
            keep_token(&client, &cli.connection.token_file, credentials.no_save, out)?;
        }
        Command::ReadFile { id: None, .. } => {
            let records = client.list_records().await?;
            if records.is_empty() {
                writeln!(out, "No records found")?;
            }
            for record in records {
                writeln!(out, "[{}] - {} ({})", record.id, record.name, record.kind)?;
            }
        }
        Command::ReadFile {
            id: Some(id),
            out_dir,
        } => {
            let content = client.read_record(id).await?;
            if content.kind == KIND_FILE {
                let path = out_dir.join(record_file_name(&content.name)?);
                write_private(&path, &content.data)?;
                writeln!(out, "Saved to {}", path.display())?;
            } else {
                writeln!(out, "{}", String::from_utf8_lossy(&content.data))?;
            }
        }
        Command::WriteFile(args) => {
            let (name, kind, data) = upload_source(args.text, args.file, args.name)?;
            let id = client.upload(&name, kind, data, args.chunk_size).await?;
            writeln!(out, "Record {id} written")?;
        }
        Command::DeleteFile { id } => {
            let deleted = client.delete_record(id).await?;
            if deleted == 0 {
                writeln!(out, "Record {id} not found")?;
            } else {
                writeln!(out, "Record {id} deleted")?;
            }
        }
    }
    Ok(())
}

fn upload_source(
    text: Option<String>,
    file: Option<PathBuf>,
    name: Option<String>,
) -> Result<(String, &'static str, Vec<u8>), AgentError> {
    match (text, file) {
        (_, Some(path)) => {
            let data = std::fs::read(&path).map_err(|source| AgentError::Read {
                path: path.clone(),
                source,
            })?;
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or(AgentError::MissingName)?,
            };
            Ok((name, KIND_FILE, data))
        }
        (Some(text), None) => {
            let name = name.filter(|n| !n.is_empty()).ok_or(AgentError::MissingName)?;
            Ok((name, KIND_TEXT, text.into_bytes()))
        }
        (None, None) => Err(AgentError::MissingName),
    }
}

fn keep_token(
    client: &VaultClient,
    token_file: &Path,
    no_save: bool,
    out: &mut dyn Write,
) -> Result<(), AgentError> {
    let Some(token) = client.token() else {
        return Ok(());
    };
    if no_save {
        writeln!(out, "Token: {token}")?;
        return Ok(());
    }
    write_private(token_file, format!("{token}\n").as_bytes())?;
    writeln!(out, "Token saved to {}", token_file.display())?;
    Ok(())
}

/// Saved token, or `None` when the file is absent or empty.
pub fn load_token(path: &Path) -> Result<Option<String>, AgentError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(AgentError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Last path component of a record name. Names that would escape the
/// output directory are refused.
pub fn record_file_name(name: &str) -> Result<&str, AgentError> {
    let candidate = Path::new(name);
    match candidate.file_name().and_then(|n| n.to_str()) {
        Some(file_name) if file_name == name => Ok(file_name),
        _ => Err(AgentError::UnsafeFileName(name.to_string())),
    }
}

/// Write `data` to `path`, readable by the owner only.
fn write_private(path: &Path, data: &[u8]) -> Result<(), AgentError> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options
        .open(path)
        .and_then(|mut file| file.write_all(data))
        .map_err(|source| AgentError::Write {
            path: path.to_path_buf(),
            source,
        })
}
