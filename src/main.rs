use anyhow::Result;
use clap::{Parser, Subcommand};
use paddlecast_core::{AppError, Config, ConfigError};
use paddlecast_forecast::{
    assess_hour, classify, coords, score, CoordinateError, ForecastResult, ForecastService,
    HourlyCondition, ScoreInput,
};

/// Paddling conditions and safety ratings for any coordinate
#[derive(Parser, Debug)]
#[command(name = "paddlecast")]
#[command(about = "Paddling safety forecasts", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 3-day hourly forecast with a safety rating per hour
    Forecast {
        /// Latitude in degrees (-90 to 90)
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees (-180 to 180)
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Conditions for the current local hour
    Current {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Rate a hand-entered hour
    Score {
        /// Starting rating (1-5); neutral when omitted
        #[arg(long)]
        rating: Option<f64>,
        /// Wind speed in km/h
        #[arg(long, default_value_t = 10.0)]
        wind: f64,
        /// Gust speed in km/h (defaults to the wind speed)
        #[arg(long)]
        gust: Option<f64>,
        /// Air temperature in °C
        #[arg(long, default_value_t = 20.0, allow_negative_numbers = true)]
        temp: f64,
        /// Visibility in km
        #[arg(long, default_value_t = 10.0)]
        visibility: f64,
        /// Hazard text, repeatable (e.g. -w "WARNING: Strong winds")
        #[arg(short = 'w', long = "warning")]
        warnings: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    paddlecast_core::init()?;
    let args = Args::parse();

    match args.command {
        Command::Forecast { lat, lng, json } => {
            let service = load_service()?;
            let result = service.get_forecast(lat, lng).await.unwrap_or_else(|e| exit_invalid(e));
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_forecast(&result);
            }
        }
        Command::Current { lat, lng } => {
            let service = load_service()?;
            let condition = service.get_current(lat, lng).await.unwrap_or_else(|e| exit_invalid(e));
            println!("{}", condition.source.description());
            print_hour(&condition, true);
        }
        Command::Score {
            rating,
            wind,
            gust,
            temp,
            visibility,
            warnings,
        } => {
            // Offline: needs neither config nor network
            let input = ScoreInput {
                rating,
                wind_speed_kph: Some(wind),
                gust_speed_kph: gust.or(Some(wind)),
                temperature_c: Some(temp),
                visibility_km: Some(visibility),
            };
            print_score(&input, &warnings);
        }
    }

    Ok(())
}

fn load_service() -> Result<ForecastService> {
    let config = match Config::load_validated() {
        Ok((config, _)) => config,
        Err(e) => {
            let err = AppError::from(ConfigError::from_load_error(&e));
            eprintln!("{}", err.user_message());
            return Err(err.into());
        }
    };
    Ok(ForecastService::from_config(&config.forecast)?)
}

fn exit_invalid(e: CoordinateError) -> ! {
    tracing::debug!("Rejected coordinate: {}", e);
    let err = AppError::from(e);
    eprintln!("{} ({})", err.user_message(), err);
    std::process::exit(2);
}

fn print_forecast(result: &ForecastResult) {
    let location = &result.location;
    println!(
        "{}, {}, {} ({:.4}, {:.4})",
        location.name,
        location.region,
        location.country,
        location.coordinates.latitude(),
        location.coordinates.longitude()
    );
    match result.metadata.fallback_reason {
        Some(reason) if result.is_fallback() => {
            println!("{} (upstream {})", result.source().description(), reason)
        }
        _ => println!("{}", result.source().description()),
    }

    let local_hour = coords::local_hour_now(&location.coordinates);
    for (index, day) in result.forecast.iter().enumerate() {
        println!("\n{}", day.date.format("%A %Y-%m-%d"));
        let now_key = if index == 0 {
            coords::current_hour_key(local_hour, day.hourly.keys().copied())
        } else {
            None
        };
        for (hour, condition) in &day.hourly {
            print_hour(condition, now_key == Some(*hour));
        }
    }
}

fn print_hour(condition: &HourlyCondition, is_now: bool) {
    let assessment = assess_hour(condition);
    println!(
        "{} {:02}:00  {:>5.1}°C  wind {:>3.0} km/h {:<3} gusts {:>3.0}  vis {:>4.1} km  {:.1}/5 {}{}",
        if is_now { ">" } else { " " },
        condition.hour,
        condition.temperature_c,
        condition.wind_speed_kph,
        condition.wind_direction,
        condition.gust_speed_kph,
        condition.visibility_km,
        assessment.rating,
        assessment.band,
        if condition.source == paddlecast_forecast::DataSource::Fallback {
            " *"
        } else {
            ""
        }
    );
    for explanation in &assessment.explanations {
        println!("           {}", explanation);
    }
}

fn print_score(input: &ScoreInput, warnings: &[String]) {
    let rating = score(input, warnings);
    let classification = classify(rating, warnings);
    println!("Rating: {:.1}/5 ({})", rating, classification.band);
    for explanation in &classification.explanations {
        println!("  {}", explanation);
    }
}
