use fieldops_sync::backend::db::mappings::count_mappings;
use fieldops_sync::backend::db::sync_config::load_sync_config;
use fieldops_sync::backend::db::sync_log::recent_sync_log;
use fieldops_sync::backend::server::config::load_database;
use fieldops_sync::shared::accounting::EntityType;
use fieldops_sync::shared::Settings;
use chrono::Utc;

const LOG_ROWS: i64 = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;

    println!("🔍 DEBUGGING SYNC STATE");
    println!("=======================");
    println!("DATABASE_URL: {}", settings.database_url);
    println!("Attachment store: {}", settings.attachment_dir.display());
    println!("QuickBooks API: {} ({:?})", settings.quickbooks.api_base, settings.quickbooks.environment);

    println!("\n🧪 Opening database...");
    let pool = match load_database(&settings).await {
        Ok(pool) => {
            println!("✅ Database ready, migrations applied");
            pool
        }
        Err(e) => {
            println!("❌ Database unavailable: {}", e);
            return Err(e.into());
        }
    };

    println!("\n🔗 QuickBooks connection");
    match load_sync_config(&pool).await? {
        Some(config) if config.is_connected => {
            let remaining = config.token_expires_at - Utc::now();
            println!("✅ Connected to realm {}", config.realm_id);
            println!("   Connected at: {}", config.connected_at);
            if remaining.num_seconds() > 0 {
                println!("   Access token valid for {} more minute(s)", remaining.num_minutes());
            } else {
                println!("⚠️  Access token expired at {}, next call will refresh", config.token_expires_at);
            }
        }
        Some(config) => println!("⚠️  Disconnected (last realm {}, updated {})", config.realm_id, config.updated_at),
        None => println!("⚠️  Never connected"),
    }

    println!("\n📋 Mappings");
    for entity in EntityType::ALL {
        let count = count_mappings(&pool, entity).await?;
        println!("   {:<16} {}", entity.as_str(), count);
    }

    println!("\n📜 Latest sync log");
    let entries = recent_sync_log(&pool, LOG_ROWS).await?;
    if entries.is_empty() {
        println!("   (empty)");
    }
    for entry in entries {
        let marker = match entry.error_message {
            Some(_) => "❌",
            None => "✅",
        };
        println!(
            "{} {} {:<14} {:<18} {:<8} {}",
            marker,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.entity_type,
            entry.action,
            entry.status.as_str(),
            entry.error_message.unwrap_or_default()
        );
    }

    Ok(())
}
