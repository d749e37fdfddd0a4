//! Sample destinations for a fresh installation.

use tdm_db::models::destination::CreateDestination;
use tdm_db::repositories::DestinationRepo;
use tdm_db::DbPool;

struct SampleDestination {
    name: &'static str,
    weather: &'static str,
    state: &'static str,
    district: &'static str,
    map_link: &'static str,
    description: &'static str,
}

const SAMPLES: [SampleDestination; 3] = [
    SampleDestination {
        name: "Taj Mahal",
        weather: "Sunny",
        state: "Uttar Pradesh",
        district: "Agra",
        map_link: "https://goo.gl/maps/5Hsm5",
        description: "An ivory-white marble mausoleum on the right bank of the Yamuna river \
                      in the Indian city of Agra.",
    },
    SampleDestination {
        name: "Golden Temple",
        weather: "Mild",
        state: "Punjab",
        district: "Amritsar",
        map_link: "https://goo.gl/maps/xyz",
        description: "A gurdwara located in the city of Amritsar, Punjab, India, the holiest \
                      Gurdwara and the most important pilgrimage site of Sikhism.",
    },
    SampleDestination {
        name: "Mysore Palace",
        weather: "Pleasant",
        state: "Karnataka",
        district: "Mysore",
        map_link: "https://goo.gl/maps/abc",
        description: "A historical palace and the royal residence at Mysore in the Indian \
                      state of Karnataka.",
    },
];

#[derive(Debug, Default)]
pub struct SampleReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Get-or-create each sample destination by name.
pub async fn load_sample(pool: &DbPool) -> anyhow::Result<SampleReport> {
    let mut report = SampleReport::default();
    for sample in &SAMPLES {
        if DestinationRepo::find_by_name(pool, sample.name).await?.is_some() {
            report.existing.push(sample.name.to_string());
            continue;
        }
        let input = CreateDestination {
            name: sample.name.to_string(),
            slug: None,
            weather: sample.weather.to_string(),
            state: sample.state.to_string(),
            district: sample.district.to_string(),
            map_link: Some(sample.map_link.to_string()),
            description: sample.description.to_string(),
        };
        let destination = DestinationRepo::create(pool, &input).await?;
        tracing::info!(destination_id = destination.id, slug = %destination.slug, "Created sample destination");
        report.created.push(destination.name);
    }
    Ok(report)
}

pub fn print_report(report: &SampleReport) {
    for name in &report.created {
        println!("Created destination: {name}");
    }
    println!(
        "Sample data loaded: {} created, {} already present",
        report.created.len(),
        report.existing.len()
    );
}
