// UI layer: command-line surface of the client.
//
// Each subcommand maps onto one `ApiClient` operation. Rendering, prompts
// and the spinner live here so the library stays silent; errors bubble up
// to `main` through anyhow, which turns them into a non-zero exit code.

use crate::api::{ApiClient, CallResult};
use crate::config::{self, ClientConfig, DeletePolicy};
use crate::model::{DeleteOutcome, FieldSpec, Format, GenerateRequest, GeneratedData, TypeDescriptor};
use crate::transport::Transport;
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use crossterm::style::Stylize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::{Command as Process, Stdio};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "mockaroo", version, about = "A client for the Mockaroo API")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// API key (falls back to $API_KEY, then ~/.mockaroo_key).
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,
    /// Service host (falls back to $MOCKAROO_HOST).
    #[arg(long, global = true)]
    pub host: Option<String>,
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Use plain http instead of https.
    #[arg(long, global = true, default_value_t = false)]
    pub insecure: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate mock data from a schema name or inline fields.
    Gen(GenArgs),
    /// Upload a csv or txt dataset.
    Upload {
        name: String,
        input_file: PathBuf,
    },
    /// Delete a dataset.
    Delete {
        name: String,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long, default_value_t = false)]
        yes: bool,
        /// Succeed when the dataset does not exist.
        #[arg(long, default_value_t = false)]
        missing_ok: bool,
    },
    /// List supported data types.
    Types {
        /// Page output.
        #[arg(short = 'P', long, default_value_t = false)]
        pager: bool,
    },
    /// Save an API key to ~/.mockaroo_key.
    SetKey { api_key: String },
}

#[derive(Args, Debug)]
pub struct GenArgs {
    /// Schema name, a JSON array of fields, or @file.json with one.
    pub schema_or_fields: String,
    /// Number of records.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,
    /// Output format: json, csv, txt, xml or sql.
    #[arg(short = 'f', long = "format", alias = "fmt", default_value = "json", value_parser = parse_format)]
    pub format: Format,
    /// Omit the header row for csv and txt.
    #[arg(long, default_value_t = false)]
    pub no_header: bool,
    /// Always return a JSON array, even for one record.
    #[arg(long, default_value_t = false)]
    pub array: bool,
}

fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// What `gen` should generate from.
#[derive(Debug, Clone, PartialEq)]
pub enum GenSource {
    Schema(String),
    Fields(Vec<FieldSpec>),
}

/// `[...]` is parsed as inline fields, `@path` reads fields from a file,
/// anything else is a schema name.
pub fn parse_source(arg: &str) -> Result<GenSource> {
    let trimmed = arg.trim();
    if trimmed.starts_with('[') {
        let fields = serde_json::from_str(trimmed).context("Parsing inline field list")?;
        return Ok(GenSource::Fields(fields));
    }
    if let Some(path) = trimmed.strip_prefix('@') {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read field file {}", path))?;
        let fields = serde_json::from_str(&data)
            .with_context(|| format!("Parsing field list in {}", path))?;
        return Ok(GenSource::Fields(fields));
    }
    Ok(GenSource::Schema(trimmed.to_string()))
}

impl GenArgs {
    pub fn to_request(&self) -> Result<GenerateRequest> {
        let req = match parse_source(&self.schema_or_fields)? {
            GenSource::Schema(schema) => GenerateRequest::from_schema(schema),
            GenSource::Fields(fields) => GenerateRequest::from_fields(fields),
        };
        let mut req = req.count(self.count).format(self.format).array(self.array);
        if self.no_header {
            req = req.header(false);
        }
        Ok(req)
    }
}

/// Build the client config from global flags and the environment.
pub fn client_config(global: &GlobalArgs) -> ClientConfig {
    let mut config = ClientConfig::from_env(global.api_key.clone())
        .with_secure(!global.insecure)
        .with_port(global.port);
    if let Some(host) = &global.host {
        config = config.with_host(host.clone());
    }
    config
}

/// Entry point used by `main`.
pub fn run(cli: Cli) -> Result<()> {
    if let Command::SetKey { api_key } = &cli.command {
        let path = config::key_file_path().context("Could not locate home directory")?;
        config::persist_key(&path, api_key)?;
        println!("API key saved to {}", path.display());
        return Ok(());
    }

    let mut config = client_config(&cli.global);
    if let Command::Delete { missing_ok: true, .. } = &cli.command {
        config = config.with_delete_policy(DeletePolicy::Idempotent);
    }
    let api = ApiClient::new(config).context("Failed to build HTTP client")?;

    let stdout = std::io::stdout();
    let styled = stdout.is_terminal();
    let mut out = stdout.lock();
    execute(&api, cli.command, &mut out, styled)
}

/// Run one command against `api`, writing results to `out`.
pub fn execute<T: Transport, W: Write>(
    api: &ApiClient<T>,
    command: Command,
    out: &mut W,
    styled: bool,
) -> Result<()> {
    match command {
        Command::Gen(args) => {
            let req = args.to_request()?;
            let data = finish(with_spinner("Generating...", || api.generate(&req)))
                .context("Generate failed")?;
            out.write_all(render_generated(&data)?.as_bytes())?;
        }
        Command::Upload { name, input_file } => {
            let confirmation = finish(with_spinner("Uploading...", || {
                api.upload(&name, &input_file)
            }))
            .with_context(|| format!("Upload of {} failed", input_file.display()))?;
            if confirmation.success {
                writeln!(out, "{}", paint("Uploaded!", Tone::Good, styled))?;
            } else {
                writeln!(out, "Upload not confirmed: {}", serde_json::to_string(&confirmation)?)?;
            }
        }
        Command::Delete { name, yes, .. } => {
            if !yes && !confirm_delete(&name)? {
                writeln!(out, "Aborted.")?;
                return Ok(());
            }
            let outcome = finish(with_spinner("Deleting...", || api.delete(&name)))
                .with_context(|| format!("Delete of dataset '{}' failed", name))?;
            match outcome {
                DeleteOutcome::Deleted(c) if c.success => {
                    writeln!(out, "{}", paint("Deleted!", Tone::Bad, styled))?
                }
                DeleteOutcome::Deleted(c) => {
                    writeln!(out, "Delete not confirmed: {}", serde_json::to_string(&c)?)?
                }
                DeleteOutcome::Missing => writeln!(out, "Dataset '{}' does not exist.", name)?,
            }
        }
        Command::Types { pager } => {
            let types = finish(with_spinner("Fetching types...", || api.types()))
                .context("Listing types failed")?;
            let table = render_types(&types);
            if pager {
                let command = std::env::var("PAGER").unwrap_or_else(|_| "less -R".into());
                page(out, &command, &table)?;
            } else {
                writeln!(out, "{}", table)?;
            }
        }
        Command::SetKey { .. } => anyhow::bail!("set-key is handled before a client is built"),
    }
    out.flush()?;
    Ok(())
}

fn finish<T>(result: CallResult<T>) -> Result<T> {
    debug!(trace = %result.trace, "call finished");
    Ok(result.into_result()?)
}

/// Spinner on stderr while `f` runs. Hidden when stderr is not a terminal.
fn with_spinner<T>(message: &'static str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let value = f();
    spinner.finish_and_clear();
    value
}

fn confirm_delete(name: &str) -> Result<bool> {
    let answer = Confirm::new()
        .with_prompt(format!("Are you sure you want to delete '{}'?", name))
        .default(false)
        .interact()
        .context("Confirmation prompt failed (use --yes in scripts)")?;
    Ok(answer)
}

enum Tone {
    Good,
    Bad,
}

fn paint(text: &str, tone: Tone, styled: bool) -> String {
    if !styled {
        return text.to_string();
    }
    match tone {
        Tone::Good => text.green().bold().to_string(),
        Tone::Bad => text.red().bold().to_string(),
    }
}

/// Pretty JSON for structured output, verbatim text otherwise.
pub fn render_generated(data: &GeneratedData) -> Result<String> {
    match data {
        GeneratedData::Json(value) => {
            let mut text = serde_json::to_string_pretty(value)?;
            text.push('\n');
            Ok(text)
        }
        GeneratedData::Text(text) => Ok(text.clone()),
    }
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "Parameters")]
    parameters: String,
}

pub fn render_types(types: &[TypeDescriptor]) -> String {
    let rows = types.iter().map(|t| TypeRow {
        name: t.name.clone(),
        category: t.category.clone(),
        parameters: describe_parameters(t),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

fn describe_parameters(t: &TypeDescriptor) -> String {
    if t.parameters.is_empty() {
        return "None".to_string();
    }
    t.parameters
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{}.) Name: {} Type: {} Description: '{}' Default: {}",
                i + 1,
                p.name,
                p.param_type,
                p.description,
                p.default
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pipe `text` through the `pager` command line, writing to `out` instead
/// if the pager can't be started.
fn page<W: Write>(out: &mut W, pager: &str, text: &str) -> Result<()> {
    let mut parts = pager.split_whitespace();
    let Some(program) = parts.next() else {
        writeln!(out, "{}", text)?;
        return Ok(());
    };

    match Process::new(program).args(parts).stdin(Stdio::piped()).spawn() {
        Ok(mut child) => {
            if let Some(mut stdin) = child.stdin.take() {
                // A pager quit early closes the pipe; that's not an error.
                let _ = writeln!(stdin, "{}", text);
            }
            child.wait().context("Pager failed")?;
        }
        Err(err) => {
            debug!(pager = %pager, error = %err, "pager unavailable, printing directly");
            writeln!(out, "{}", text)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeParameter;
    use serde_json::json;

    #[test]
    fn parses_gen_defaults() {
        let cli = Cli::try_parse_from(["mockaroo", "gen", "Person"]).unwrap();
        let Command::Gen(args) = cli.command else {
            panic!("expected gen");
        };
        let req = args.to_request().unwrap();
        assert_eq!(req.schema.as_deref(), Some("Person"));
        assert_eq!(req.count, 1);
        assert_eq!(req.format, Format::Json);
        assert_eq!(req.header, None);
    }

    #[test]
    fn parses_gen_options_and_fmt_alias() {
        let cli = Cli::try_parse_from([
            "mockaroo", "gen", "Person", "--fmt", "CSV", "-n", "5", "--no-header",
        ])
        .unwrap();
        let Command::Gen(args) = cli.command else {
            panic!("expected gen");
        };
        let req = args.to_request().unwrap();
        assert_eq!(req.format, Format::Csv);
        assert_eq!(req.count, 5);
        assert_eq!(req.header, Some(false));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["mockaroo", "gen", "Person", "-f", "yaml"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mockaroo", "types", "--api-key", "k", "--host", "localhost", "--insecure", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.verbose, 2);
        let config = client_config(&cli.global);
        assert_eq!(config.api_key(), Some("k"));
        assert_eq!(config.base_url(), "http://localhost");
    }

    #[test]
    fn inline_fields_source() {
        let source = parse_source(r#"[{"name":"id","type":"Row Number"}]"#).unwrap();
        assert_eq!(
            source,
            GenSource::Fields(vec![FieldSpec::new("id", "Row Number")])
        );
        assert!(parse_source("[{").is_err());
    }

    #[test]
    fn field_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.json");
        std::fs::write(
            &path,
            r#"[{"name":"color","type":"Custom List","values":["red","blue"]}]"#,
        )
        .unwrap();
        let source = parse_source(&format!("@{}", path.display())).unwrap();
        assert_eq!(
            source,
            GenSource::Fields(vec![
                FieldSpec::new("color", "Custom List").with_values(["red", "blue"])
            ])
        );
    }

    #[test]
    fn types_table_lists_parameters() {
        let types = vec![
            TypeDescriptor {
                name: "Words".into(),
                category: "string".into(),
                parameters: vec![TypeParameter {
                    name: "min".into(),
                    param_type: "integer".into(),
                    description: "min value".into(),
                    default: json!(10),
                }],
            },
            TypeDescriptor {
                name: "Row Number".into(),
                category: "integer".into(),
                parameters: vec![],
            },
        ];
        let table = render_types(&types);
        assert!(table.contains("Words"));
        assert!(table.contains("1.) Name: min Type: integer Description: 'min value' Default: 10"));
        assert!(table.contains("None"));
    }

    #[test]
    fn generated_output_rendering() {
        let json = render_generated(&GeneratedData::Json(json!({"id": 1}))).unwrap();
        assert_eq!(json, "{\n  \"id\": 1\n}\n");
        let csv = render_generated(&GeneratedData::Text("id\n1\n".into())).unwrap();
        assert_eq!(csv, "id\n1\n");
    }

    #[test]
    fn pager_falls_back_to_the_writer() {
        let mut out = Vec::new();
        page(&mut out, "", "table").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "table\n");

        let mut out = Vec::new();
        page(&mut out, "mockaroo-no-such-pager -R", "table").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "table\n");
    }

    #[test]
    fn plain_messages_when_not_a_terminal() {
        assert_eq!(paint("Uploaded!", Tone::Good, false), "Uploaded!");
        assert_eq!(paint("Deleted!", Tone::Bad, false), "Deleted!");
    }
}
