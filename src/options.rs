use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(about = "Single lookup options")]
pub struct CheckAllowanceOptions {
    #[structopt(short = "c", long = "chain", default_value = "bsc")]
    pub chain: String,

    #[structopt(short = "a", long = "address", help = "Wallet address of the holder")]
    pub address: String,

    ///endpoints separated by comma, replace the ones configured for the chain
    #[structopt(long = "rpc-endpoints")]
    pub rpc_endpoints: Option<String>,
}

#[derive(StructOpt)]
#[structopt(about = "Batch lookup options")]
pub struct BatchAllowanceOptions {
    #[structopt(
        short = "c",
        long = "chain",
        default_value = "bsc",
        help = "Chain used for entries without chain prefix"
    )]
    pub chain: String,

    ///list of entries separated by comma, each entry is address or chain:address
    #[structopt(short = "a", long = "addresses")]
    pub addresses: String,

    #[structopt(long = "batch-size", help = "Override number of lookups per wave")]
    pub batch_size: Option<usize>,

    #[structopt(long = "interval", help = "Minimum interval between waves in seconds")]
    pub interval: Option<f64>,

    #[structopt(long = "summary", help = "Print per chain totals")]
    pub summary: bool,
}

#[derive(StructOpt)]
#[structopt(about = "Endpoint health check options")]
pub struct CheckRpcOptions {
    #[structopt(short = "c", long = "chain", default_value = "bsc")]
    pub chain: String,

    #[structopt(long = "skip-decimals", help = "Do not read token decimals from endpoints")]
    pub skip_decimals: bool,

    ///endpoints separated by comma, replace the ones configured for the chain
    #[structopt(long = "rpc-endpoints")]
    pub rpc_endpoints: Option<String>,
}

#[derive(StructOpt)]
pub enum AllowanceCommands {
    #[structopt(about = "Resolve balance and allowance of a single address")]
    CheckAllowance {
        #[structopt(flatten)]
        check_allowance_options: CheckAllowanceOptions,
    },
    #[structopt(about = "Resolve balance and allowance of many addresses")]
    BatchAllowance {
        #[structopt(flatten)]
        batch_allowance_options: BatchAllowanceOptions,
    },
    #[structopt(about = "Probe every configured endpoint of a chain")]
    CheckRpc {
        #[structopt(flatten)]
        check_rpc_options: CheckRpcOptions,
    },
}

#[derive(StructOpt)]
#[structopt(about = "ERC20 balance and allowance resolver")]
pub struct AllowanceOptions {
    #[structopt(
        long = "config",
        help = "Config file, ALLOWANCE_CONFIG env variable is used when not set"
    )]
    pub config: Option<String>,

    #[structopt(subcommand)]
    pub commands: AllowanceCommands,
}
