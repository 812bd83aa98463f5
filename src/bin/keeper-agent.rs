// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use clap::Parser;
use keeper_server::{agent, config::LogFormat, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = agent::Cli::parse();
    logging::init_with_filter(LogFormat::Pretty, logging::AGENT_FILTER);

    let mut stdout = std::io::stdout();
    match agent::run(cli, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
