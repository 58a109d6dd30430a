use celestizen_core::{generate_chart_data, interpret_chart, AnalyticEphemeris, BirthInfo, Location};
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::error::Error;
use urlencoding::encode;

const USER_AGENT: &str = "CelestiZen/1.0 (Astrology App)";

/// One match from the Nominatim search endpoint.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

/// Resolved coordinates for a place name.
#[derive(Debug)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    display_name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Collect command-line arguments
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args.len() > 5 {
        eprintln!("Usage: {} <place> <YYYY-MM-DD> [HH:MM] [TimeZoneOffset]", args[0]);
        eprintln!("Example: {} \"Calicut, India\" 1991-06-18 07:10 +05:30", args[0]);
        return Ok(());
    }

    let place = &args[1];
    let date = NaiveDate::parse_from_str(&args[2], "%Y-%m-%d")
        .map_err(|e| format!("Error parsing date: {}", e))?;
    let time = match args.get(3) {
        Some(raw) => Some(
            NaiveTime::parse_from_str(raw, "%H:%M")
                .map_err(|e| format!("Error parsing time: {}", e))?,
        ),
        None => None,
    };
    let timezone = match args.get(4) {
        Some(raw) => parse_offset(raw)?,
        None => FixedOffset::east_opt(0).ok_or("zero offset")?,
    };

    // Initialize HTTP client
    let client = Client::new();

    // A raw "lat,lon" argument skips the search and is reverse-geocoded for
    // its display name instead.
    let resolved = match parse_coordinates(place) {
        Some((latitude, longitude)) => GeocodingResult {
            latitude,
            longitude,
            display_name: reverse_geocode(&client, latitude, longitude).await,
        },
        None => geocode(&client, place).await?,
    };

    println!("Natal Chart for:");
    println!("Place: {}", resolved.display_name);
    println!("Location: Latitude {}, Longitude {}", resolved.latitude, resolved.longitude);
    println!("Date: {} (offset {})", date, timezone);
    println!("----------------------------------------");

    let birth_info =
        BirthInfo::new(date, time, Location::new(resolved.latitude, resolved.longitude))
            .with_timezone(timezone);

    let chart = generate_chart_data(&AnalyticEphemeris, &birth_info)?;

    println!("Sun Sign: {}", chart.sun_sign);
    println!("Moon Sign: {}", chart.moon_sign);
    println!("Rising Sign: {}", chart.rising_sign);
    println!();

    println!("Planets:");
    for planet in &chart.planets {
        println!(
            "  {}: {:.2}° in {} (house {})",
            planet.planet, planet.degree, planet.sign, planet.house
        );
    }
    println!();

    println!("Houses:");
    for house in &chart.houses {
        println!("  House {}: {:.2}° in {}", house.number, house.degree, house.sign);
    }
    println!();

    if !chart.aspects.is_empty() {
        println!("Aspects:");
        for aspect in &chart.aspects {
            println!(
                "  {} {} {} ({}°, orb {:.2}°)",
                aspect.planet1, aspect.aspect, aspect.planet2, aspect.angle, aspect.orb
            );
        }
        println!();
    }

    let balance = &chart.elemental_balance;
    println!(
        "Elements: fire {:.0}%, earth {:.0}%, air {:.0}%, water {:.0}%",
        balance.fire, balance.earth, balance.air, balance.water
    );
    let modality = &chart.modality_distribution;
    println!(
        "Modalities: cardinal {:.0}%, fixed {:.0}%, mutable {:.0}%",
        modality.cardinal, modality.fixed, modality.mutable
    );
    println!();

    for insight in interpret_chart(&chart) {
        println!("{}: {}", insight.topic, insight.description);
    }

    Ok(())
}

// Function to resolve a place name to coordinates via the Nominatim API
async fn geocode(client: &Client, place: &str) -> Result<GeocodingResult, Box<dyn Error>> {
    let url = format!(
        "https://nominatim.openstreetmap.org/search?q={}&format=json&limit=1",
        encode(place)
    );

    let response = client
        .get(&url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(format!("Geocoding failed with status: {}", response.status()).into());
    }

    let places: Vec<NominatimPlace> = response.json().await?;
    let first = places.into_iter().next().ok_or("Location not found")?;

    Ok(GeocodingResult {
        latitude: first.lat.parse()?,
        longitude: first.lon.parse()?,
        display_name: first.display_name,
    })
}

// Function to turn coordinates back into a display name; degrades to the raw
// coordinates on any failure
async fn reverse_geocode(client: &Client, latitude: f64, longitude: f64) -> String {
    let url = format!(
        "https://nominatim.openstreetmap.org/reverse?lat={}&lon={}&format=json",
        latitude, longitude
    );

    let fetched = async {
        let response = client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .ok()?;
        let body: serde_json::Value = response.json().await.ok()?;
        body.get("display_name")?.as_str().map(str::to_string)
    };

    match fetched.await {
        Some(name) => name,
        None => format!("{}, {}", latitude, longitude),
    }
}

// Parse a "lat,lon" pair, e.g. "10.522,76.172"
fn parse_coordinates(raw: &str) -> Option<(f64, f64)> {
    let (lat, lon) = raw.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

// Parse a "+HH:MM" / "-HH:MM" timezone offset
fn parse_offset(raw: &str) -> Result<FixedOffset, Box<dyn Error>> {
    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(format!("Invalid timezone offset: {}", raw).into());
    };
    let (hours, minutes) = rest.split_once(':').ok_or("Offset must be ±HH:MM")?;
    let hours: i32 = hours.parse()?;
    let minutes: i32 = minutes.parse()?;
    let seconds = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(seconds).ok_or_else(|| format!("Offset out of range: {}", raw).into())
}
