//! rackforge: drive a provisioning controller from the command line.
//!
//! Thin glue only: arguments in, one workflow run, a JSON report out.
//! Everything of substance lives in `rackforge-control`.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use rackforge_client::{ControllerEndpoint, Credentials, Method, Params, Session};
use rackforge_control::{CallRequest, DeployRequest, Orchestrator, Report, WaitRequest};

/// Drive a provisioning controller: deploy machines, wait for status
/// transitions, pass raw API calls through.
#[derive(Parser, Debug)]
#[command(name = "rackforge", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Validate and report without mutating the controller.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Controller base URL.
    #[arg(long, env = "RACKFORGE_URL", default_value = rackforge_client::DEFAULT_BASE_URL)]
    url: String,

    /// API version to speak.
    #[arg(long, env = "RACKFORGE_API_VERSION", default_value = rackforge_client::DEFAULT_API_VERSION)]
    api_version: String,

    /// Three-part API key (consumer:token:secret).
    #[arg(long, env = "RACKFORGE_API_KEY")]
    api_key: Option<String>,

    /// Username, when authenticating with a password instead of a key.
    #[arg(long, env = "RACKFORGE_USERNAME")]
    username: Option<String>,

    /// Password, when authenticating with a password instead of a key.
    #[arg(long, env = "RACKFORGE_PASSWORD")]
    password: Option<String>,
}

impl ConnectionArgs {
    /// Pick the active credential form; neither being supplied is a
    /// configuration error before any network call.
    fn credentials(&self) -> Result<Credentials, String> {
        if let Some(key) = &self.api_key {
            return Credentials::from_api_key(key).map_err(|e| e.to_string());
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::Password {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(
                "no credentials: supply --api-key or both --username and --password".to_string(),
            ),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy a machine, optionally waiting for completion.
    Deploy(DeployArgs),
    /// Wait for a machine to reach a target status.
    Wait(WaitArgs),
    /// Pass one API call through to the controller.
    Call(CallArgs),
}

#[derive(Args, Debug)]
struct DeployArgs {
    /// System id of the machine.
    system_id: String,

    /// Cloud-init user data for first boot.
    #[arg(long)]
    user_data: Option<String>,

    /// OS series to install (controller default when omitted).
    #[arg(long)]
    distro_series: Option<String>,

    /// Hardware-enablement kernel.
    #[arg(long)]
    hwe_kernel: Option<String>,

    /// Comment for the controller event log.
    #[arg(long)]
    comment: Option<String>,

    /// Register the machine as a KVM host after deployment.
    #[arg(long)]
    install_kvm: bool,

    /// Block until the deployment finishes.
    #[arg(long)]
    wait: bool,

    /// Poll interval in seconds while waiting.
    #[arg(long, default_value_t = 5)]
    wait_interval: u64,

    /// Overall deadline in seconds while waiting.
    #[arg(long, default_value_t = 600)]
    wait_timeout: u64,
}

#[derive(Args, Debug)]
struct WaitArgs {
    /// System id of the machine.
    system_id: String,

    /// Target status (name or numeric code); repeatable.
    #[arg(long, required = true)]
    target: Vec<String>,

    /// Additional statuses to tolerate while waiting; repeatable.
    #[arg(long)]
    acceptable: Vec<String>,

    /// Poll interval in seconds.
    #[arg(long, default_value_t = 5)]
    wait_interval: u64,

    /// Overall deadline in seconds.
    #[arg(long, default_value_t = 600)]
    wait_timeout: u64,
}

#[derive(Args, Debug)]
struct CallArgs {
    /// HTTP method (GET, POST, PUT, DELETE).
    method: String,

    /// Relative endpoint, query string included (e.g. "machines/?op=...").
    endpoint: String,

    /// Form parameter as key=value; repeatable.
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Report error statuses instead of failing on them.
    #[arg(long)]
    ignore_errors: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let report = run(cli).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Build the session and run one workflow; every outcome becomes a report.
async fn run(cli: Cli) -> Report {
    let credentials = match cli.connection.credentials() {
        Ok(credentials) => credentials,
        Err(msg) => return Report::failure(msg),
    };

    let endpoint = match ControllerEndpoint::new(&cli.connection.url, &cli.connection.api_version)
    {
        Ok(endpoint) => endpoint,
        Err(err) => return Report::failure(err.to_string()),
    };

    let session = match Session::connect(endpoint, credentials).await {
        Ok(session) => session,
        Err(err) => return Report::failure(format!("could not connect to controller: {err}")),
    };

    let orchestrator = Orchestrator::new(&session);

    match cli.command {
        Command::Deploy(args) => {
            let system_id = match args.system_id.parse() {
                Ok(id) => id,
                Err(err) => return Report::failure(format!("{err}")),
            };
            let mut request = DeployRequest::new(system_id);
            request.user_data = args.user_data;
            request.distro_series = args.distro_series;
            request.hwe_kernel = args.hwe_kernel;
            request.comment = args.comment;
            request.install_kvm = args.install_kvm;
            request.wait = args.wait;
            request.wait_interval = Duration::from_secs(args.wait_interval);
            request.wait_timeout = Duration::from_secs(args.wait_timeout);

            Report::from_deploy(orchestrator.deploy(&request, cli.dry_run).await)
        }
        Command::Wait(args) => {
            let system_id = match args.system_id.parse() {
                Ok(id) => id,
                Err(err) => return Report::failure(format!("{err}")),
            };
            let request = WaitRequest {
                system_id,
                target: args.target,
                acceptable: args.acceptable,
                wait_interval: Duration::from_secs(args.wait_interval),
                wait_timeout: Duration::from_secs(args.wait_timeout),
            };

            Report::from_wait(orchestrator.wait_for_status(&request).await)
        }
        Command::Call(args) => {
            let method: Method = match args.method.parse() {
                Ok(method) => method,
                Err(err) => return Report::failure(format!("{err}")),
            };
            let request = CallRequest {
                method,
                endpoint: args.endpoint,
                params: args.params.into_iter().collect::<Params>(),
                fail_on_error: !args.ignore_errors,
            };

            Report::from_call(orchestrator.api_call(&request, cli.dry_run).await)
        }
    }
}
