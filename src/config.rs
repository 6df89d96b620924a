use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};

use crate::storage::{DurabilityMode, DurableEmployeeStore, EmployeeStore, InMemoryEmployeeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Process-local map, lost on restart.
    Memory,
    /// Write-ahead log plus snapshots under the data directory.
    Durable,
}

/// Command-line flags. Each one falls back to its `EMP_*` environment
/// variable, then to the default.
#[derive(Debug, Parser)]
#[command(name = "employee_api", version, about = "Employee CRUD HTTP service")]
pub struct Cli {
    #[arg(long, env = "EMP_BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "EMP_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    #[arg(long, env = "EMP_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    #[arg(long, env = "EMP_DURABILITY", default_value = "sync")]
    pub durability: DurabilityMode,

    #[arg(long, env = "EMP_CHECKPOINT_THRESHOLD", default_value_t = 1000)]
    pub checkpoint_threshold: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
    pub data_dir: PathBuf,
    pub durability: DurabilityMode,
    pub checkpoint_threshold: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        ensure!(
            cli.checkpoint_threshold > 0,
            "EMP_CHECKPOINT_THRESHOLD must be greater than zero"
        );

        Ok(Self {
            bind_addr: cli.bind_addr,
            store: cli.store,
            data_dir: cli.data_dir,
            durability: cli.durability,
            checkpoint_threshold: cli.checkpoint_threshold,
        })
    }

    pub fn open_store(&self) -> Result<Arc<dyn EmployeeStore>> {
        let store: Arc<dyn EmployeeStore> = match self.store {
            StoreKind::Memory => Arc::new(InMemoryEmployeeStore::new()),
            StoreKind::Durable => Arc::new(
                DurableEmployeeStore::open_with_threshold(
                    &self.data_dir,
                    self.durability,
                    self.checkpoint_threshold,
                )
                .with_context(|| {
                    format!("failed to open store in {}", self.data_dir.display())
                })?,
            ),
        };
        Ok(store)
    }
}
