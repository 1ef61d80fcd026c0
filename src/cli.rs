use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::api::{MAX_SIMULATION_YEARS, MAX_SIMULATIONS, run_http_server};
use crate::core::{
    Debt, ExtraPaymentSolveConfig, FilingStatus, IncomeType, MonteCarloParams, PayoffStrategy,
    Result, ScenarioData, ScenarioStore, calculate_payoff_plan, compare_strategies,
    effective_rate, project, simulate, solve_extra_payment, tax_breakdown, validate_horizon,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Snowball,
    Avalanche,
}

impl From<CliStrategy> for PayoffStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Snowball => PayoffStrategy::Snowball,
            CliStrategy::Avalanche => PayoffStrategy::Avalanche,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliIncomeType {
    Salary,
    Freelance,
    Investment,
    Equity,
    Other,
    Bonus,
    Rsu,
}

impl From<CliIncomeType> for IncomeType {
    fn from(value: CliIncomeType) -> Self {
        match value {
            CliIncomeType::Salary => IncomeType::Salary,
            CliIncomeType::Freelance => IncomeType::Freelance,
            CliIncomeType::Investment => IncomeType::Investment,
            CliIncomeType::Equity => IncomeType::Equity,
            CliIncomeType::Other => IncomeType::Other,
            CliIncomeType::Bonus => IncomeType::Bonus,
            CliIncomeType::Rsu => IncomeType::Rsu,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
}

impl From<CliFilingStatus> for FilingStatus {
    fn from(value: CliFilingStatus) -> Self {
        match value {
            CliFilingStatus::Single => FilingStatus::Single,
            CliFilingStatus::MarriedFilingJointly => FilingStatus::MarriedFilingJointly,
            CliFilingStatus::MarriedFilingSeparately => FilingStatus::MarriedFilingSeparately,
            CliFilingStatus::HeadOfHousehold => FilingStatus::HeadOfHousehold,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "wealthcast",
    about = "Household wealth projection, debt payoff and Monte Carlo calculator"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, help = "Scenario JSON used as the base scenario")]
        scenario: Option<PathBuf>,
    },
    /// Print the year-by-year projection for a scenario JSON file.
    Project {
        #[arg(long)]
        input: PathBuf,
    },
    /// Debt payoff plan, strategy comparison or required extra payment.
    Debts {
        #[arg(long, help = "JSON array of debts")]
        input: PathBuf,
        #[arg(long, default_value_t = 0.0, help = "Extra monthly payment")]
        extra: f64,
        #[arg(long, value_enum, default_value_t = CliStrategy::Avalanche)]
        strategy: CliStrategy,
        #[arg(long, help = "Compare snowball against avalanche")]
        compare: bool,
        #[arg(
            long,
            conflicts_with = "compare",
            help = "Solve for the extra payment that clears all debts within this many months"
        )]
        target_months: Option<u32>,
    },
    /// Monte Carlo percentile bands.
    Simulate {
        #[arg(long, default_value_t = 0.0)]
        initial_wealth: f64,
        #[arg(long, default_value_t = 0.0)]
        annual_contribution: f64,
        #[arg(long, default_value_t = 7.0, help = "Expected yearly return in percent")]
        expected_return: f64,
        #[arg(long, default_value_t = 15.0, help = "Yearly return volatility in percent")]
        volatility: f64,
        #[arg(long, default_value_t = 30)]
        years: u32,
        #[arg(long, default_value_t = 1_000)]
        simulations: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Federal and state tax on a single amount.
    Tax {
        #[arg(long)]
        income: f64,
        #[arg(long, value_enum, default_value_t = CliIncomeType::Salary)]
        income_type: CliIncomeType,
        #[arg(long, default_value = "California")]
        state: String,
        #[arg(long, value_enum, default_value_t = CliFilingStatus::Single)]
        filing_status: CliFilingStatus,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxReport {
    federal: f64,
    state: f64,
    total: f64,
    effective_rate: f64,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn simulation_params(
    initial_wealth: f64,
    annual_contribution: f64,
    expected_return: f64,
    volatility: f64,
    years: u32,
    simulations: u32,
    seed: u64,
) -> Result<MonteCarloParams> {
    if simulations == 0 {
        return Err(crate::core::Error::Input(
            "--simulations must be > 0".to_string(),
        ));
    }
    if simulations > MAX_SIMULATIONS {
        return Err(crate::core::Error::Input(format!(
            "--simulations must be <= {MAX_SIMULATIONS}"
        )));
    }
    if years > MAX_SIMULATION_YEARS {
        return Err(crate::core::Error::Input(format!(
            "--years must be <= {MAX_SIMULATION_YEARS}"
        )));
    }
    if volatility < 0.0 {
        return Err(crate::core::Error::Input(
            "--volatility must be >= 0".to_string(),
        ));
    }
    Ok(MonteCarloParams {
        initial_wealth,
        annual_contribution,
        expected_return,
        volatility,
        years,
        simulations,
        seed,
    })
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve {
            host,
            port,
            scenario,
        } => {
            let base = match scenario {
                Some(path) => read_json::<ScenarioData>(&path)?,
                None => ScenarioData::default(),
            };
            validate_horizon(base.projection_years)?;
            run_http_server(SocketAddr::new(host, port), ScenarioStore::new(base)).await?;
            Ok(())
        }
        Command::Project { input } => {
            let data: ScenarioData = read_json(&input)?;
            validate_horizon(data.projection_years)?;
            print_json(&project(&data))
        }
        Command::Debts {
            input,
            extra,
            strategy,
            compare,
            target_months,
        } => {
            let debts: Vec<Debt> = read_json(&input)?;
            if compare {
                return print_json(&compare_strategies(&debts, extra));
            }
            if let Some(target_months) = target_months {
                let config = ExtraPaymentSolveConfig {
                    target_months,
                    ..ExtraPaymentSolveConfig::default()
                };
                return print_json(&solve_extra_payment(&debts, strategy.into(), config)?);
            }
            print_json(&calculate_payoff_plan(&debts, extra, strategy.into()))
        }
        Command::Simulate {
            initial_wealth,
            annual_contribution,
            expected_return,
            volatility,
            years,
            simulations,
            seed,
        } => {
            let params = simulation_params(
                initial_wealth,
                annual_contribution,
                expected_return,
                volatility,
                years,
                simulations,
                seed,
            )?;
            print_json(&simulate(&params))
        }
        Command::Tax {
            income,
            income_type,
            state,
            filing_status,
        } => {
            let income_type = income_type.into();
            let filing_status = filing_status.into();
            let split = tax_breakdown(income, income_type, &state, filing_status);
            print_json(&TaxReport {
                federal: split.federal,
                state: split.state,
                total: split.total(),
                effective_rate: effective_rate(income, income_type, &state, filing_status),
            })
        }
    }
}
