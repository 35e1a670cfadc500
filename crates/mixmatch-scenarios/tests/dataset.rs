use mixmatch_scenarios::{
    discover_datasets, ScenarioDataset, ScenarioError, DEFAULT_SCENARIO_DATA_DIRNAME,
};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::{tempdir, TempDir};

fn write_dataset(root: &Path) {
    fs::create_dir_all(root.join(DEFAULT_SCENARIO_DATA_DIRNAME)).unwrap();
    fs::write(root.join("scenarios.csv"), "id,label\nMid,Mid Case\nLow,Low Cost\n").unwrap();
    fs::write(
        root.join("attributes.csv"),
        "id,label,units\ncapacity,Capacity,GW\ngeneration,Generation,TWh\n",
    )
    .unwrap();
    fs::write(root.join("temporal_resolutions.csv"), "id,label\nannual,Annual\n").unwrap();
    fs::write(
        root.join("spatial_resolutions.csv"),
        "id,label\nnational,National\nstates,States\n",
    )
    .unwrap();

    let data = root.join(DEFAULT_SCENARIO_DATA_DIRNAME);
    let files = [
        (
            "Mid.capacity.annual.national.csv",
            "tech,time,value\nWind,2020,100\nWind,2030,120\nCoal,2020,50\nCoal,2030,40\n",
        ),
        (
            "Mid.generation.annual.national.csv",
            "tech,time,value\nWind,2020,0.6\nWind,2030,0.7\nCoal,2020,0.4\nCoal,2030,0.3\n",
        ),
        (
            "Mid.capacity.annual.states.csv",
            "gid,tech,time,value\nCO,Wind,2020,60\nCO,Wind,2030,70\nCO,Coal,2020,30\nCO,Coal,2030,25\nUT,Wind,2020,40\nUT,Wind,2030,50\n",
        ),
        (
            "Low.capacity.annual.national.csv",
            "tech,time,value\nWind,2020,80\nWind,2030,90\nNuclear,2020,10\nNuclear,2030,10\n",
        ),
    ];
    for (name, body) in files {
        fs::write(data.join(name), body).unwrap();
    }
}

fn open_fixture() -> (TempDir, ScenarioDataset) {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Standard Scenarios");
    write_dataset(&root);
    let dataset = ScenarioDataset::open(&root).unwrap();
    (dir, dataset)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn lists_dataset_dimensions() {
    let (_dir, dataset) = open_fixture();
    assert_eq!(dataset.name(), "Standard Scenarios");
    assert_eq!(dataset.gentypes().unwrap(), vec!["Coal", "Nuclear", "Wind"]);
    assert_eq!(dataset.years().unwrap(), vec!["2020", "2030"]);
    assert_eq!(dataset.scenarios(), vec!["Low", "Mid"]);
    assert_eq!(
        dataset.scenario_labels()[1],
        ("Mid".to_string(), "Mid Case".to_string())
    );
    assert_eq!(dataset.geographies().unwrap(), vec!["national", "CO", "UT"]);
}

#[test]
fn national_genmix_has_fractions_and_total() {
    let (_dir, dataset) = open_fixture();
    let mix = dataset.get_genmix("2020", "Mid", &["national"]).unwrap();
    assert_eq!(
        mix.columns(),
        &[
            "Capacity (GW)",
            "Generation (TWh)",
            "Capacity Fraction",
            "Generation Fraction"
        ]
    );
    assert_eq!(mix.get("Wind", "Capacity (GW)"), Some(100.0));
    assert_eq!(mix.get("TOTAL", "Capacity (GW)"), Some(150.0));
    assert!(close(mix.get("Wind", "Capacity Fraction").unwrap(), 2.0 / 3.0));
    assert!(close(mix.column_sum("Generation Fraction").unwrap(), 1.0));
    assert!(close(mix.get("TOTAL", "Capacity Fraction").unwrap(), 1.0));

    // scenario may be named by label
    let by_label = dataset.get_genmix("2020", "Mid Case", &["national"]).unwrap();
    assert_eq!(by_label, mix);
}

#[test]
fn state_genmix_sums_requested_states() {
    let (_dir, dataset) = open_fixture();
    let mix = dataset.get_genmix("2020", "Mid", &["CO", "UT"]).unwrap();
    // only the capacity attribute has a state file
    assert_eq!(mix.columns(), &["Capacity (GW)", "Capacity Fraction"]);
    assert_eq!(mix.get("Wind", "Capacity (GW)"), Some(100.0));
    assert_eq!(mix.get("Coal", "Capacity (GW)"), Some(30.0));

    let ut_only = dataset.get_genmix("2030", "Mid", &["UT"]).unwrap();
    assert_eq!(ut_only.get("Wind", "Capacity (GW)"), Some(50.0));
    assert!(!ut_only.contains_row("Coal"));
}

#[test]
fn genmix_errors() {
    let (_dir, dataset) = open_fixture();
    assert!(matches!(
        dataset.get_genmix("2020", "Mid", &["TX"]).unwrap_err(),
        ScenarioError::UnknownGeography { .. }
    ));
    assert!(matches!(
        dataset.get_genmix("2040", "Mid", &["national"]).unwrap_err(),
        ScenarioError::NoGenerationMixAvailable { .. }
    ));
    assert!(matches!(
        dataset.get_genmix("2020", "High", &["national"]).unwrap_err(),
        ScenarioError::NoGenerationMixAvailable { .. }
    ));
}

#[test]
fn zero_sum_column_has_missing_fractions() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Standard Scenarios");
    write_dataset(&root);
    fs::write(root.join("scenarios.csv"), "id,label\nMid,Mid Case\nIdle,Idle Fleet\n").unwrap();
    let data = root.join(DEFAULT_SCENARIO_DATA_DIRNAME);
    fs::write(
        data.join("Idle.capacity.annual.national.csv"),
        "tech,time,value\nWind,2020,10\nCoal,2020,5\n",
    )
    .unwrap();
    fs::write(
        data.join("Idle.generation.annual.national.csv"),
        "tech,time,value\nWind,2020,0\nCoal,2020,0\n",
    )
    .unwrap();

    let dataset = ScenarioDataset::open(&root).unwrap();
    let mix = dataset.get_genmix("2020", "Idle", &["national"]).unwrap();
    assert!(mix.get("Wind", "Generation Fraction").unwrap().is_nan());
    assert!(mix.get("Coal", "Generation Fraction").unwrap().is_nan());
    assert_eq!(mix.get("TOTAL", "Generation (TWh)"), Some(0.0));
    assert!(close(mix.get("Wind", "Capacity Fraction").unwrap(), 2.0 / 3.0));
}

#[test]
fn configured_attributes_limit_the_mix() {
    let (_dir, dataset) = open_fixture();
    let dataset = dataset.with_genmix_attributes(["capacity"]);
    let mix = dataset.get_genmix("2020", "Mid", &["national"]).unwrap();
    assert_eq!(mix.columns(), &["Capacity (GW)", "Capacity Fraction"]);
}

#[test]
fn value_trees_are_cached() {
    let (_dir, dataset) = open_fixture();
    let file = &dataset.groups()[1].files[0];
    let first = dataset.data(file).unwrap();
    let second = dataset.data(file).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn timeseries_covers_every_year() {
    let (_dir, dataset) = open_fixture();
    let records = dataset.get_timeseries("Mid", &["national"]).unwrap();
    // 2 years x (2 types + TOTAL) x 4 columns
    assert_eq!(records.len(), 24);
    assert!(records.iter().all(|r| r.geography == "national"));
    let wind_2030 = records
        .iter()
        .find(|r| r.year == "2030" && r.gentype == "Wind" && r.variable == "Capacity (GW)")
        .unwrap();
    assert_eq!(wind_2030.value, 120.0);
    assert!(records.iter().any(|r| r.gentype == "TOTAL"));
}

#[test]
fn discovers_dataset_directories() {
    let dir = tempdir().unwrap();
    write_dataset(&dir.path().join("b"));
    write_dataset(&dir.path().join("a"));
    fs::create_dir(dir.path().join("not-a-dataset")).unwrap();
    let found = discover_datasets(dir.path()).unwrap();
    let names: Vec<_> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}
