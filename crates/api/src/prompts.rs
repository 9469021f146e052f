use std::fmt::Write;

use serde_json::Value;

use crate::{ChatLocation, WeatherSummary};

const FORECAST_VARIABLES_TEXT: &str = "\
- Wind speed (velocidad_viento)
- Precipitation (precipitacion)
- Humidity (humedad)
- Temperature (temperatura)
- Surface pressure (presion_superficie)
- Solar radiation (radiacion_solar)
- Infrared radiation (radiacion_infrarroja)";

const FORECAST_SHAPE: &str = r#"{
    "summary": {
        "temperatura": <kelvin>,
        "temperatura_min": <kelvin>,
        "temperatura_max": <kelvin>,
        "nubosidad": "<text description>",
        "precipitacion": <mm>,
        "humedad": <kg/kg>,
        "radiacion_solar": <W/m2>,
        "velocidad_viento": <m/s>
    },
    "data": {
        "velocidad_viento": [{"time": "<hour>", "value": <value>}],
        "precipitacion": [{"time": "<hour>", "value": <value>}],
        "humedad": [{"time": "<hour>", "value": <value>}],
        "temperatura": [{"time": "<hour>", "value": <value>}],
        "presion_superficie": [{"time": "<hour>", "value": <value>}],
        "radiacion_solar": [{"time": "<hour>", "value": <value>}],
        "radiacion_infrarroja": [{"time": "<hour>", "value": <value>}]
    },
    "recomendations": [
        "Recommendation based on temperature and humidity",
        "Clothing advice for the wind and precipitation levels",
        "Activities that suit these conditions"
    ]
}"#;

/// Hourly forecast request; the reply must be a bare JSON object
pub fn forecast_prompt(
    summary: &WeatherSummary,
    start_time: &str,
    end_time: &str,
    plan: &str,
) -> String {
    let plan_context = if plan.trim().is_empty() {
        String::new()
    } else {
        format!(
            "\n\nUser plan: {}\nTailor the recommendations to this plan.",
            plan.trim()
        )
    };

    format!(
        "RETURN ONLY A VALID JSON OBJECT. NO INTRODUCTORY TEXT, NO EXPLANATIONS, NO MARKDOWN CODE FENCES.

CRITICAL INSTRUCTION: ALL RECOMMENDATIONS MUST BE WRITTEN IN ENGLISH ONLY.

You are an expert meteorologist forecasting conditions for outdoor activities.

Forecast the following variables:
{FORECAST_VARIABLES_TEXT}

Historical data for the day, with statistics: {data}

Forecast period:
- Start hour: {start_time}
- End hour: {end_time}{plan_context}

INSTRUCTIONS:
1. Produce hourly predictions from {start_time} to {end_time}.
2. Add a general summary with averages and overall conditions.
3. Use presion_superficie, radiacion_infrarroja and radiacion_solar to judge cloudiness.
4. Write 3 to 5 specific, actionable recommendations tied to the predicted conditions, the hour range, safety precautions, clothing and the user plan when one is given.

Expected structure:
{FORECAST_SHAPE}

Every variable in 'data' must have one entry per hour from {start_time} to {end_time}.",
        data = summary.to_prompt_json(),
    )
}

/// Free-text feedback on a user's plan for the day
pub fn feedback_prompt(
    summary: &WeatherSummary,
    start_time: &str,
    end_time: &str,
    plan: &str,
) -> String {
    format!(
        "A weather forecast is wanted for the following variables:
{FORECAST_VARIABLES_TEXT}

Data for the day, with statistics: {data}

Period start: {start_time}
Period end: {end_time}

Based on your forecast, write feedback about that day taking into account the person's plan: {plan}

Also consider the predicted summary of the day:
'summary': {{
    \"temperatura\": <value>,
    \"temperatura_min\": <value>,
    \"temperatura_max\": <value>,
    \"nubosidad\": <value>,
    \"precipitacion\": <value>,
    \"humedad\": <value>,
    \"radiacion_solar\": <value>,
    \"velocidad_viento\": <value>
}}

CRITICAL: Base your recommendations on the ACTUAL data, not generic examples, and separate each recommendation clearly.

MANDATORY: Write ALL text content in ENGLISH only.",
        data = summary.to_prompt_json(),
    )
}

const SUMMARY_FIELDS: [(&str, &str, &str); 8] = [
    ("temperatura", "Temperature", " K"),
    ("temperatura_min", "Min Temperature", " K"),
    ("temperatura_max", "Max Temperature", " K"),
    ("nubosidad", "Cloudiness", ""),
    ("precipitacion", "Precipitation", " mm"),
    ("humedad", "Humidity", " kg/kg"),
    ("radiacion_solar", "Solar Radiation", " W/m²"),
    ("velocidad_viento", "Wind Speed", " m/s"),
];

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Location and time lines, empty when neither is known
pub fn chat_context(location: Option<&ChatLocation>, current_time: Option<&str>) -> String {
    let mut context = String::new();
    if let Some(location) = location {
        let coord = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());
        let _ = write!(
            context,
            "\nUser's current location: {} (Latitude: {}, Longitude: {})",
            location.address.as_deref().unwrap_or("Unknown location"),
            coord(location.lat),
            coord(location.lon),
        );
    }
    if let Some(current_time) = current_time.filter(|t| !t.trim().is_empty()) {
        let _ = write!(context, "\nCurrent date and time: {}", current_time);
    }
    context
}

/// Summary and earlier recommendations out of a forecast response
pub fn weather_context(weather_data: Option<&Value>) -> String {
    let Some(weather_data) = weather_data.filter(|v| !v.is_null()) else {
        return String::new();
    };

    let mut context = String::from("\n\nWEATHER DATA CONTEXT:");
    // The forecast may come wrapped in {"data": ...} or bare
    let summary = weather_data
        .pointer("/data/summary")
        .or_else(|| weather_data.get("summary"));
    if let Some(summary) = summary {
        context.push_str("\nWeather Summary:");
        for (key, label, unit) in SUMMARY_FIELDS {
            let _ = write!(
                context,
                "\n- {}: {}{}",
                label,
                display_value(summary.get(key)),
                unit
            );
        }
    }

    let recommendations = weather_data
        .get("recomendations")
        .or_else(|| weather_data.pointer("/data/recomendations"))
        .and_then(Value::as_array)
        .filter(|recs| !recs.is_empty());
    if let Some(recommendations) = recommendations {
        context.push_str("\n\nPrevious Weather Recommendations:");
        for (i, rec) in recommendations.iter().enumerate() {
            let _ = write!(context, "\n{}. {}", i + 1, display_value(Some(rec)));
        }
    }
    context
}

/// The user's prompt, wrapped with whatever context is known
pub fn simple_chat_prompt(
    prompt: &str,
    location: Option<&ChatLocation>,
    current_time: Option<&str>,
    weather_data: Option<&Value>,
) -> String {
    let context = chat_context(location, current_time);
    let weather = weather_context(weather_data);
    if context.is_empty() && weather.is_empty() {
        return prompt.to_string();
    }

    format!(
        "Context information:
Please provide a helpful response considering the user's location, current time, and weather data when relevant.
Write ALL text content in ENGLISH only. Keep a kind, friendly and engaging tone tailored to the user's situation.
CRITICAL: Base your advice on the ACTUAL weather data provided, not generic examples.

The response must be a single block of text without sections or titles.
{context}{weather}

User's question: {prompt}
"
    )
}
