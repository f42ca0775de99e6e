// End-to-end tests for the melody pipeline.
//
// Each test runs the public API the way the `generate` binary does:
// config -> chain -> walk -> pitches -> MIDI bytes, then checks the
// properties that must hold for any seed plus a few fixed scenarios.

use markov_melody::MarkovError;
use markov_melody::config::GenerationConfig;
use markov_melody::markov::{Distribution, History, TransitionModel, build_model};
use markov_melody::midi::{MidiSettings, write_midi, write_midi_to};
use markov_melody::pipeline::{BuildMode, generate};
use markov_melody::scale::{Scale, map_to_pitches};
use markov_melody::walk::sample_sequence;
use markov_melody_prng::MelodyRng;
use midly::{MidiMessage, Smf, TrackEventKind};

fn note_on_keys(bytes: &[u8]) -> Vec<u8> {
    let smf = Smf::parse(bytes).unwrap();
    smf.tracks
        .iter()
        .flatten()
        .filter_map(|event| match event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } => Some(key.as_int()),
            _ => None,
        })
        .collect()
}

#[test]
fn full_pipeline_round_trips_through_midi() {
    let config = GenerationConfig::default();
    let melody = generate(&config, &mut MelodyRng::new(2024), BuildMode::Sequential).unwrap();

    let mut bytes = Vec::new();
    write_midi_to(&melody.pitches, &config.midi, &mut bytes).unwrap();
    assert_eq!(note_on_keys(&bytes), melody.pitches);
    assert_eq!(melody.pitches.len(), config.order + config.steps);
    assert_eq!(&melody.pitches[..2], &[60, 65]);
}

#[test]
fn seeds_reproduce_bit_identical_files() {
    let config = GenerationConfig {
        steps: 64,
        ..Default::default()
    };
    let render = |seed: u64, mode: BuildMode| {
        let melody = generate(&config, &mut MelodyRng::new(seed), mode).unwrap();
        let mut bytes = Vec::new();
        write_midi_to(&melody.pitches, &config.midi, &mut bytes).unwrap();
        bytes
    };
    assert_eq!(render(5, BuildMode::Sequential), render(5, BuildMode::Sequential));
    assert_eq!(render(5, BuildMode::Parallel), render(5, BuildMode::Parallel));
}

#[test]
fn sticky_chain_repeats_its_seed() {
    let model = TransitionModel::from_distributions(
        2,
        1,
        vec![
            (History::from([0]), Distribution::new(vec![1.0, 0.0]).unwrap()),
            (History::from([1]), Distribution::new(vec![0.0, 1.0]).unwrap()),
        ],
    )
    .unwrap();
    let mut rng = MelodyRng::new(31);
    assert_eq!(
        sample_sequence(&model, 1, &History::from([0]), 4, &mut rng).unwrap(),
        vec![0, 0, 0, 0, 0]
    );
    assert_eq!(
        sample_sequence(&model, 1, &History::from([1]), 3, &mut rng).unwrap(),
        vec![1, 1, 1, 1]
    );
}

#[test]
fn zero_steps_is_just_the_seed() {
    let mut rng = MelodyRng::new(8);
    let model = build_model(3, 2, &mut rng).unwrap();
    let seq = sample_sequence(&model, 2, &History::from([0, 1]), 0, &mut rng).unwrap();
    assert_eq!(seq, vec![0, 1]);
}

#[test]
fn scale_maps_triad_on_middle_c() {
    let pitches = map_to_pitches(&[0, 1, 2], &Scale::default_triad(), 60).unwrap();
    assert_eq!(pitches, vec![60, 65, 67]);
}

#[test]
fn wider_chain_stays_in_its_alphabet() {
    let config = GenerationConfig {
        num_states: 5,
        order: 3,
        init: vec![4, 0, 2],
        steps: 200,
        scale: Scale::new(vec![0, 2, 4, 7, 9]).unwrap(),
        ..Default::default()
    };
    let melody = generate(&config, &mut MelodyRng::new(77), BuildMode::Parallel).unwrap();
    assert_eq!(melody.model.len(), 125);
    assert_eq!(melody.symbols.len(), 203);
    assert!(melody.symbols.iter().all(|&s| s < 5));
    assert!(melody.pitches.iter().all(|p| [60, 62, 64, 67, 69].contains(p)));
}

#[test]
fn config_file_drives_a_run_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("run.json");
    std::fs::write(
        &config_path,
        r#"{"steps": 6, "seed": 3, "midi": {"note_duration": 240, "velocity": 90}}"#,
    )
    .unwrap();
    let config = GenerationConfig::load(&config_path).unwrap();
    let seed = config.seed.unwrap();
    let melody = generate(&config, &mut MelodyRng::new(seed), BuildMode::Sequential).unwrap();

    let out = dir.path().join("song.mid");
    write_midi(&melody.pitches, &config.midi, &out).unwrap();
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(note_on_keys(&bytes), melody.pitches);
    assert_eq!(
        config.midi,
        MidiSettings {
            ticks_per_quarter: 480,
            note_duration: 240,
            velocity: 90,
        }
    );
}

#[test]
fn mismatched_seed_history_is_rejected() {
    let config = GenerationConfig {
        order: 3,
        ..Default::default()
    };
    assert!(matches!(
        generate(&config, &mut MelodyRng::new(1), BuildMode::Sequential),
        Err(MarkovError::InvalidHistory { .. })
    ));
}
