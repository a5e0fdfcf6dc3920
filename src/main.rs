use clap::Parser;
use shop_ask::utils::error::{AgentError, ErrorSeverity};
use shop_ask::utils::{logger, validation::Validate};
use shop_ask::{AppConfig, AskPipeline, AskRequest, CliConfig, Command, StubAnalytics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting shop-ask CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match AppConfig::load(cli.config.as_deref()).and_then(|c| {
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let pipeline = AskPipeline::from_settings(StubAnalytics::new(), &config);

    let outcome = match cli.command {
        Command::Ask {
            store_id,
            json,
            question,
        } => pipeline
            .ask(&AskRequest::new(store_id, question))
            .await
            .and_then(|response| {
                if json {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                } else {
                    println!("{}", response.answer);
                    println!("(confidence: {})", response.confidence);
                }
                Ok(())
            }),
        Command::Query { store_id, query } => pipeline
            .run_query(&query, &store_id)
            .await
            .and_then(|raw| {
                println!("{}", serde_json::to_string_pretty(&raw)?);
                Ok(())
            }),
    };

    if let Err(e) = outcome {
        report_and_exit(e);
    }

    Ok(())
}

fn report_and_exit(e: AgentError) -> ! {
    tracing::error!(
        "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 2,
        ErrorSeverity::Medium => 3,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 4,
    };
    std::process::exit(exit_code);
}
