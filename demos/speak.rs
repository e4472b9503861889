use std::path::Path;
use std::time::Instant;

use polyvox::{
    catalog::VoiceCatalog,
    dispatcher::{DispatcherConfigBuilder, SynthesisDispatcher, SynthesisRequest},
    engines::vits::{VitsConfig, VitsFactory},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let voice = args.next().unwrap_or_else(|| "david".to_string());
    let text = args.next().unwrap_or_else(|| {
        "Hello! This is a multi-voice text to speech demo. \
         Each voice loads its own model on first use and stays cached."
            .to_string()
    });

    let catalog = VoiceCatalog::load(Path::new("models/voices.json"))?;
    println!(
        "Available voices: {:?}",
        catalog.names().collect::<Vec<_>>()
    );

    // Encode artifacts at the rate the models were trained at.
    let vits_config = VitsConfig::load(Path::new("models/config.json"))?;
    let config = DispatcherConfigBuilder::default()
        .models_dir("models")
        .output_dir("output")
        .sample_rate(vits_config.audio.sample_rate)
        .build()?;
    let dispatcher = SynthesisDispatcher::new(config, catalog, VitsFactory::default());

    let start = Instant::now();
    let path = dispatcher.synthesize(&SynthesisRequest::new(text, voice.as_str()))?;
    println!("Synthesized with '{voice}' in {:.2?}", start.elapsed());
    println!("Saved to {}", path.display());

    // The second request skips model loading entirely.
    let start = Instant::now();
    dispatcher.synthesize(&SynthesisRequest::new(
        "Cached engines respond much faster.",
        voice.as_str(),
    ))?;
    println!("Second request took {:.2?}", start.elapsed());

    Ok(())
}
