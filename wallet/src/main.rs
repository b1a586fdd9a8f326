use std::{fs::File, io::Write, path::Path};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use log::{error, info};
use primitive_types::U256;
use tokenbank_common::{
    config::VERSION,
    crypto::Address,
    logger::{setup_logger, LoggerConfig},
    rpc::{client::JsonRpcClient, TransactionRequest},
    storage::StorageProjector,
    units::{format_units, parse_units},
};
use tokenbank_wallet::{
    bank::{read_locks, TokenBank},
    config::{Command, Config},
    pipeline::{PipelineRun, StepStatus, TransactionPipeline},
    signer::{NodeAccountSigner, Signer, SignerError},
};
use tokio::io::{self, AsyncBufReadExt, BufReader};

// Asks on the terminal before each transaction unless --yes was given
struct ConsoleSigner {
    inner: NodeAccountSigner,
    auto_approve: bool,
}

#[async_trait]
impl Signer for ConsoleSigner {
    fn account(&self) -> Address {
        self.inner.account()
    }

    async fn approve(&self, request: &TransactionRequest) -> Result<(), SignerError> {
        if self.auto_approve {
            return self.inner.approve(request).await;
        }

        print!(
            "Send transaction from {} to {} with data 0x{}? [y/N] ",
            request.from,
            request.to,
            hex::encode(&request.data)
        );
        std::io::stdout()
            .flush()
            .map_err(|e| SignerError::Rejected(e.to_string()))?;

        let mut answer = String::new();
        BufReader::new(io::stdin())
            .read_line(&mut answer)
            .await
            .map_err(|e| SignerError::Rejected(e.to_string()))?;

        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => self.inner.approve(request).await,
            _ => Err(SignerError::Rejected("declined at prompt".into())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config: Config = Config::parse();
    if let Some(path) = config.config_file.as_ref() {
        if config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(());
            }

            let mut file = File::create(path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config).context("Error while serializing config file")?;
            file.write_all(json.as_bytes()).context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(());
        }

        // The command always comes from the command line
        let command = config.command.take();
        let file = File::open(path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
        config.command = command;
    } else if config.generate_config_template {
        eprintln!("Provided config file path is required to generate the template with --config-file");
        return Ok(());
    }

    let log_config = &config.log;
    setup_logger(LoggerConfig {
        level: log_config.log_level,
        file_level: log_config.file_log_level,
        dir_path: &log_config.logs_path,
        filename_log: &log_config.filename_log,
        disable_file_logging: log_config.disable_file_logging,
        disable_colors: log_config.disable_log_color,
        datetime_format: &log_config.datetime_format,
    })
    .context("Error while setting up logger")?;

    info!("TokenBank v{}", VERSION);

    let Some(command) = config.command.clone() else {
        eprintln!("No command provided, use --help to list them");
        return Ok(());
    };

    let client = JsonRpcClient::new(config.network.node_address.clone());
    info!("Using node {}", client.url());

    if let Err(e) = run_command(&config, &client, command).await {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}

async fn run_command(config: &Config, client: &JsonRpcClient, command: Command) -> Result<()> {
    let decimals = config.pipeline.decimals;
    match command {
        Command::Locks { start, count } => {
            let address = config
                .contracts
                .locks_contract
                .context("--locks-contract is required to list locks")?;
            let projector = StorageProjector::new(address, config.contracts.locks_descriptor());
            println!("Lock array data starts at slot {}", projector.base());

            let range = match (start, count) {
                (None, None) => None,
                (start, Some(count)) => {
                    let start = start.unwrap_or(0);
                    Some(start..start.saturating_add(count))
                }
                (Some(start), None) => {
                    let length = projector.read_length(client).await?;
                    Some(start..length)
                }
            };

            let locks = read_locks(
                client,
                &projector,
                range,
                config.pipeline.read_concurrency,
                config.pipeline.max_elements,
            )
            .await?;
            for (index, lock) in locks {
                match lock {
                    Ok(Some(lock)) => println!(
                        "locks[{}]: user: {}, start time: {}, amount: {}",
                        index,
                        lock.user,
                        lock.start_time,
                        format_units(lock.amount, decimals)
                    ),
                    Ok(None) => println!("locks[{}]: empty", index),
                    Err(e) => println!("locks[{}]: error: {}", index, e),
                }
            }
        }
        Command::Balance { account } => {
            let bank = build_bank(config)?;
            let wallet = bank.wallet_balance(client, &account).await?;
            let deposited = bank.bank_balance(client, &account).await?;
            let allowance = bank.allowance(client, &account).await?;

            println!("Account: {}", account);
            println!("Wallet balance: {}", format_units(wallet, decimals));
            println!("Bank balance: {}", format_units(deposited, decimals));
            println!("Allowance: {}", format_units(allowance, decimals));
        }
        Command::Deposit { from, amount } => {
            let bank = build_bank(config)?;
            let amount = parse_amount(&amount, decimals)?;
            let signer = console_signer(config, from);

            let run = bank.deposit(client, &signer, amount).await?;
            report_run(&run)?;

            let deposited = bank.bank_balance(client, &from).await?;
            println!("Bank balance: {}", format_units(deposited, decimals));
        }
        Command::Withdraw { from, amount } => {
            let bank = build_bank(config)?;
            let amount = parse_amount(&amount, decimals)?;
            let signer = console_signer(config, from);

            let run = bank.withdraw(client, &signer, amount).await?;
            report_run(&run)?;

            let wallet = bank.wallet_balance(client, &from).await?;
            println!("Wallet balance: {}", format_units(wallet, decimals));
        }
    }

    Ok(())
}

fn build_bank(config: &Config) -> Result<TokenBank> {
    let contracts = &config.contracts;
    let token = contracts
        .token_contract
        .context("--token-contract is required")?;
    let bank = contracts
        .bank_contract
        .context("--bank-contract is required")?;

    let pipeline = TransactionPipeline::new(config.pipeline.confirmation());
    Ok(TokenBank::new(token, bank, pipeline)
        .with_methods(contracts.methods.clone())
        .with_read_concurrency(config.pipeline.read_concurrency)
        .with_max_elements(config.pipeline.max_elements))
}

fn console_signer(config: &Config, account: Address) -> ConsoleSigner {
    ConsoleSigner {
        inner: NodeAccountSigner::new(account),
        auto_approve: config.yes,
    }
}

fn parse_amount(value: &str, decimals: u8) -> Result<U256> {
    parse_units(value, decimals).with_context(|| format!("Invalid amount '{}'", value))
}

fn report_run(run: &PipelineRun) -> Result<()> {
    for (index, entry) in run.entries().iter().enumerate() {
        let detail = match &entry.status {
            StepStatus::Pending => String::from("not submitted"),
            StepStatus::Submitted(hash) => format!("submitted as {}", hash),
            StepStatus::Confirmed(receipt) => match &receipt.block {
                Some(block) => format!("confirmed in block {} ({})", block.number, receipt.transaction_hash),
                None => format!("confirmed ({})", receipt.transaction_hash),
            },
            StepStatus::Failed(e) => format!("failed: {}", e),
        };
        println!("Step #{} {}: {}", index, entry.step.label(), detail);
    }

    match run.failure() {
        Some((index, e)) => Err(anyhow!("Step #{} failed: {}", index, e)),
        None => Ok(()),
    }
}
