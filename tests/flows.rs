use std::io::Cursor;
use std::path::Path;

use obesity_check::app::{self, App};
use obesity_check::assets::{self, ModelBundle};
use obesity_check::config::Config;
use obesity_check::encoder::FeatureSchema;
use obesity_check::form::Prompter;
use obesity_check::model::ForestParams;
use obesity_check::predictor::Predictor;
use obesity_check::router::Page;
use obesity_check::AppError;

const HEADER: &str = "Gender,Age,Height,Weight,family_history_with_overweight,FAVC,FCVC,NCP,CAEC,SMOKE,CH2O,SCC,FAF,TUE,CALC,MTRANS,NObeyesdad";

fn write_dataset(path: &Path) {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..8 {
        let step = i as f64;
        csv.push_str(&format!(
            "Female,{},1.{},{},no,no,3,3,Sometimes,no,2,yes,2,1,no,Walking,Normal_Weight\n",
            20 + i,
            65 + i,
            58.0 + step
        ));
        csv.push_str(&format!(
            "Male,{},1.{},{},yes,yes,2,3,Frequently,no,1,no,0,2,Sometimes,Automobile,Obesity_Type_III\n",
            30 + i,
            60 + i,
            125.0 + step * 2.0
        ));
        csv.push_str(&format!(
            "Male,{},1.{},{},yes,yes,2,1,Sometimes,no,2,no,1,1,Sometimes,Public_Transportation,Overweight_Level_I\n",
            25 + i,
            70 + i,
            80.0 + step
        ));
    }
    std::fs::write(path, csv).unwrap();
}

fn config(dir: &Path) -> Config {
    let data = dir.join("obesity.csv");
    write_dataset(&data);
    Config {
        model_path: dir.join("models/obesity_model.json"),
        dataset_path: data,
        models_dir: dir.join("models"),
        results_dir: dir.join("results"),
        save_results: true,
        forest: ForestParams {
            n_trees: 25,
            seed: Some(11),
            ..ForestParams::default()
        },
    }
}

fn json(bundle: &ModelBundle) -> String {
    serde_json::to_string(bundle).unwrap()
}

fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
    Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

#[test]
fn wizard_walks_start_form_result_and_quits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let bundle = assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    let app = App::new(&config, Predictor::new(bundle));

    // start, open the form, ten answers, then quit from the result page
    let input = "\n\n1\n35\n1.62\n130\n2\n2\n3\n3\n0\n2\nq\n";
    let mut p = prompter(input);
    let session = app.run_wizard(&mut p).unwrap();

    assert!(session.is_finished());
    assert_eq!(session.page(), Page::Result);
    let result = session.result().unwrap();
    assert_eq!(result.class_name, "Obesity_Type_III");

    let out = String::from_utf8(p.into_output()).unwrap();
    assert!(out.contains("OBESITY PREDICTION FORM"));
    assert!(out.contains("Status: [!!] Obesity Type III"));
    assert!(out.contains("Results saved to:"));
    assert!(out.contains("Goodbye!"));
}

#[test]
fn wizard_back_from_result_refills_previous_answers() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.save_results = false;
    let bundle = assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    let app = App::new(&config, Predictor::new(bundle));

    // first pass, back to the form, accept every previous answer, back to
    // the form again, leave it for the start page, quit
    let input = format!(
        "\n\n2\n22\n1.66\n59\n1\n3\n3\n2\n2\n1\n\n\n{}\nb\nq\n",
        "\n".repeat(10)
    );
    let mut p = prompter(&input);
    let session = app.run_wizard(&mut p).unwrap();

    assert_eq!(session.page(), Page::Start);
    let answers = session.answers().unwrap();
    assert_eq!(answers.weight, 59.0);
    assert_eq!(answers.age, 22.0);
    assert!(!dir.path().join("results").exists());
}

#[test]
fn wizard_reports_closed_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let bundle = assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    let app = App::new(&config, Predictor::new(bundle));

    let mut p = prompter("\n\n1\n");
    assert!(matches!(app.run_wizard(&mut p), Err(AppError::InputClosed)));
}

#[test]
fn wizard_form_page_offers_back_and_quit_before_questions() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let bundle = assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    let app = App::new(&config, Predictor::new(bundle));

    let mut p = prompter("\nb\n\nq\n");
    let session = app.run_wizard(&mut p).unwrap();
    assert!(session.is_finished());
    assert_eq!(session.page(), Page::Form);
    assert!(session.answers().is_none());

    let out = String::from_utf8(p.into_output()).unwrap();
    assert_eq!(out.matches("OBESITY PREDICTION FORM").count(), 2);
    assert!(!out.contains("Gender"));
}

#[test]
fn load_or_train_caches_by_dataset_hash() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let first = assets::load_or_train(&config, FeatureSchema::Full).unwrap();
    let hash = assets::file_hash(&config.dataset_path).unwrap();
    let cached =
        assets::cache_path(&config.models_dir, FeatureSchema::Full, &hash, &config.forest).unwrap();
    assert!(cached.exists());
    assert_eq!(first.data_hash.as_deref(), Some(hash.as_str()));

    let second = assets::load_or_train(&config, FeatureSchema::Full).unwrap();
    assert_eq!(json(&first), json(&second));

    // a corrupt cache entry is replaced by a fresh model
    std::fs::write(&cached, "not json").unwrap();
    let third = assets::load_or_train(&config, FeatureSchema::Full).unwrap();
    assert_eq!(third.classes, first.classes);
    assert!(ModelBundle::load(&cached).is_ok());
}

#[test]
fn load_or_train_retrains_when_forest_params_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());

    let first = assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    assert_eq!(first.forest.n_trees(), 25);

    config.forest.n_trees = 3;
    let second = assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    assert_eq!(second.forest.n_trees(), 3);
    assert_eq!(second.params.n_trees, 3);

    config.forest.n_trees = 25;
    let third = assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    assert_eq!(json(&third), json(&first));
    assert_eq!(std::fs::read_dir(&config.models_dir).unwrap().count(), 2);
}

#[test]
fn load_or_train_without_dataset_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.dataset_path = dir.path().join("missing.csv");
    assert!(matches!(
        assets::load_or_train(&config, FeatureSchema::Compact),
        Err(AppError::MissingAsset(_))
    ));
}

#[test]
fn single_page_form_predicts_with_saved_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let bundle = assets::load_or_train(&config, FeatureSchema::Full).unwrap();
    bundle.save(&config.model_path).unwrap();

    let loaded = ModelBundle::load(&config.model_path).unwrap();
    let app = App::new(&config, Predictor::new(loaded));

    // physical data, then defaults for the remaining thirteen questions, then decline
    let input = format!("24\n1.68\n61\n{}n\n", "\n".repeat(13));
    let mut p = prompter(&input);
    app.run_form(&mut p).unwrap();

    let out = String::from_utf8(p.into_output()).unwrap();
    assert!(out.contains("Body mass index (BMI): 21.61"));
    assert!(out.contains("Probability per class:"));
    assert!(out.contains("Thank you"));
    assert!(dir.path().join("results").exists());
}

#[test]
fn failed_report_save_is_only_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, "occupied").unwrap();
    config.results_dir = blocker.clone();

    let bundle = assets::load_or_train(&config, FeatureSchema::Full).unwrap();
    let app = App::new(&config, Predictor::new(bundle));

    let input = format!("{}n\n", "\n".repeat(16));
    let mut p = prompter(&input);
    app.run_form(&mut p).unwrap();

    let out = String::from_utf8(p.into_output()).unwrap();
    assert!(out.contains("Warning: could not save results"));
    assert!(out.contains("Thank you"));
    assert!(blocker.is_file());
}

#[test]
fn train_saves_bundle_and_force_clears_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    assets::load_or_train(&config, FeatureSchema::Compact).unwrap();
    assets::load_or_train(&config, FeatureSchema::Full).unwrap();

    let mut out = Vec::new();
    let bundle = app::train(&config, FeatureSchema::Full, true, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Removed 2 cached model(s)"));
    assert!(out.contains("Records: 24"));
    assert!(out.contains("Classes: Normal_Weight, Obesity_Type_III, Overweight_Level_I"));

    let remaining: Vec<_> = std::fs::read_dir(&config.models_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(remaining, vec![std::ffi::OsString::from("obesity_model.json")]);

    let saved = ModelBundle::load(&config.model_path).unwrap();
    assert_eq!(json(&saved), json(&bundle));
    assert!(saved.data_hash.is_some());
}

#[test]
fn train_without_force_keeps_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    assets::load_or_train(&config, FeatureSchema::Compact).unwrap();

    let mut out = Vec::new();
    app::train(&config, FeatureSchema::Compact, false, &mut out).unwrap();
    assert!(!String::from_utf8(out).unwrap().contains("Removed"));
    assert_eq!(std::fs::read_dir(&config.models_dir).unwrap().count(), 2);
}

#[test]
fn form_without_saved_model_explains_how_to_train() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let mut out = Vec::new();
    let loaded = app::load_saved_model(&config, &mut out).unwrap();
    assert!(loaded.is_none());

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("ERROR: model file not found at:"));
    assert!(out.contains("obesity_model.json"));
    assert!(out.contains("obesity-check train"));
}

#[test]
fn form_with_damaged_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    std::fs::create_dir_all(&config.models_dir).unwrap();
    std::fs::write(&config.model_path, "{}").unwrap();

    let mut out = Vec::new();
    assert!(app::load_saved_model(&config, &mut out).is_err());
}
