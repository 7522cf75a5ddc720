use clap::Parser;
use std::io::Read;
use std::sync::Arc;
use webshot::capture::webdriver::WebDriverBrowser;
use webshot::config::{CaptureOptions, Settings};
use webshot::input::{self, InputFormat};
use webshot::service::{Notification, Request, Response, Service};

mod args;
use args::{Args, convert_convention, convert_format, convert_input_format, convert_mode};

/// Default WebDriver endpoint, overridable via WEBDRIVER_URL
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Starting capture batch for input: {}", args.input);

    let content = match read_input(&args.input) {
        Ok(content) => content,
        Err(e) => {
            ::log::error!("Failed to read input {}: {}", args.input, e);
            return;
        }
    };

    let format = args
        .input_format
        .map(convert_input_format)
        .unwrap_or_else(|| InputFormat::detect(&content));
    let urls = match input::parse(&content, format) {
        Ok(urls) => urls,
        Err(e) => {
            ::log::error!("Failed to parse input: {}", e);
            return;
        }
    };
    if urls.is_empty() {
        ::log::error!("No valid URLs found in input");
        return;
    }

    println!("Note: capturing requires a WebDriver server (e.g. ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default {}",
        DEFAULT_WEBDRIVER_URL
    );

    let settings = load_settings(&args);
    let options = CaptureOptions {
        delay_ms: args.delay.unwrap_or(0) * 1000,
        format: None,
        quality: None,
        max_concurrency: args.concurrency,
        timeout_ms: args.timeout.map(|secs| secs * 1000),
    };

    // Override the WebDriver URL with an environment variable if provided
    let webdriver_url = match std::env::var("WEBDRIVER_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => DEFAULT_WEBDRIVER_URL.to_string(),
    };

    let browser = Arc::new(WebDriverBrowser::new(webdriver_url));
    let (service, mut notifications) =
        Service::new(browser, settings, args.output_dir.clone());

    // Surface completion notifications as they arrive
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            match notification {
                Notification::TaskCompleted => println!("Task has been completed"),
                Notification::XlsxExported => println!("Spreadsheet exported successfully"),
            }
        }
    });

    let request = match convert_mode(args.mode) {
        webshot::CaptureMode::Visible => Request::BatchScreenshot {
            urls,
            options,
        },
        webshot::CaptureMode::FullPage => Request::BatchFullPageScreenshot {
            urls,
            options,
        },
    };

    let start_time = std::time::Instant::now();
    let response = service.handle(request).await;

    if let Response::Results { results } = response {
        let captured = results.iter().filter(|r| r.success).count();
        for result in results.iter().filter(|r| !r.success) {
            ::log::warn!(
                "failed: {} ({})",
                result.url,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        ::log::info!(
            "Batch complete - captured {} of {} pages in {:.2} seconds",
            captured,
            results.len(),
            start_time.elapsed().as_secs_f64()
        );
        println!(
            "Captured {} of {} pages; output in {}",
            captured,
            results.len(),
            args.output_dir.display()
        );
    }
}

/// Read the batch input from a file or stdin
fn read_input(input: &str) -> std::io::Result<String> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        std::fs::read_to_string(input)
    }
}

/// Load settings from the config file (when given) and apply CLI overrides
fn load_settings(args: &Args) -> Settings {
    let mut settings = match &args.config {
        Some(path) => match Settings::from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                ::log::error!("Failed to load settings from {}: {}", path.display(), e);
                Settings::default()
            }
        },
        None => Settings::default(),
    };

    if let Some(folder) = &args.folder {
        settings.folder_name = folder.clone();
    }
    if let Some(convention) = args.filename_convention {
        settings.filename_convention = convert_convention(convention);
    }
    if let Some(format) = args.format {
        settings.image_format = convert_format(format);
    }
    if let Some(quality) = args.quality {
        settings.image_quality = quality;
    }
    if args.no_spreadsheet {
        settings.include_csv = false;
    }

    settings
}
