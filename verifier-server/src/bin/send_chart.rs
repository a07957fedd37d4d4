//! send-chart - post a Helm chart to a running verifier
//!
//! Usage: send-chart <chart.tgz> [--url http://127.0.0.1:5000/upload-helm]

use std::path::PathBuf;

use anyhow::{bail, Context};
use reqwest::multipart::{Form, Part};

const DEFAULT_URL: &str = "http://127.0.0.1:5000/upload-helm";

struct Args {
    chart: PathBuf,
    url: String,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut chart = None;
    let mut url = DEFAULT_URL.to_string();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => url = args.next().context("--url needs a value")?,
            "-h" | "--help" => {
                println!("Usage: send-chart <chart.tgz> [--url URL]");
                std::process::exit(0);
            }
            _ if chart.is_none() => chart = Some(PathBuf::from(arg)),
            other => bail!("Unexpected argument: {}", other),
        }
    }

    Ok(Args {
        chart: chart.context("Usage: send-chart <chart.tgz> [--url URL]")?,
        url,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let bytes = tokio::fs::read(&args.chart)
        .await
        .with_context(|| format!("Failed to read {}", args.chart.display()))?;
    let filename = args
        .chart
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart.tgz".to_string());

    let part = Part::bytes(bytes).file_name(filename).mime_str("application/gzip")?;
    let form = Form::new().part("file", part);

    let response = reqwest::Client::new()
        .post(&args.url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", args.url))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);

    if status.is_success() {
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    } else {
        let message = body["error"].as_str().unwrap_or("no error message");
        bail!("Request failed with status code {}: {}", status.as_u16(), message)
    }
}
