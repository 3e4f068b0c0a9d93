//! An end to end run of the whole workflow on a synthetic inspections table, from csv text to partial dependence.

use crate::baseline::baseline_accuracy;
use crate::evaluate::{
	compute_permutation_importances, evaluate, PermutationImportanceOptions,
};
use crate::load::{from_csv_reader, LoadOptions};
use crate::partial_dependence::{compute_partial_dependence, PartialDependenceOptions};
use crate::pipeline::{train, PipelineConfig};
use crate::split::{label_ids, split_by_date, split_features_and_target};
use crate::wrangle::{wrangle, WrangleOptions};
use chrono::NaiveDate;
use std::fmt::Write;

const FACILITIES: &[&str] = &["Restaurant", "Grocery", "Bakery"];
const RISKS: &[&str] = &["Low", "Medium", "High"];

/// Build a csv in the shape of the inspections dataset, with an id column, a constant column, a leaky column, a free text column, coordinates, and an outcome that is a deterministic function of risk and facility type.
fn synthetic_csv() -> String {
	let mut csv = String::from(
		"Inspection ID,Inspection Date,Facility Type,Risk,Address,State,Latitude,Longitude,Serious Violations Found,Fail\n",
	);
	let start = NaiveDate::from_ymd(2015, 1, 1);
	for i in 0..240usize {
		let date = start + chrono::Duration::days(5 * i as i64);
		let facility = FACILITIES[(i / 3) % 3];
		let risk = RISKS[i % 3];
		let fail = if risk == "High" || (risk == "Medium" && facility == "Bakery") {
			1
		} else {
			0
		};
		writeln!(
			csv,
			"{},{},{},{},{} W Main St,IL,{:.2},{:.2},{},{}",
			1000 + i,
			date.format("%Y-%m-%d"),
			facility,
			risk,
			100 + i,
			41.6 + (i % 40) as f32 * 0.01,
			-87.9 + (i % 40) as f32 * 0.01,
			fail,
			fail,
		)
		.unwrap();
	}
	csv
}

fn load_and_wrangle() -> crate::load::DatedDataFrame {
	let csv = synthetic_csv();
	let options = LoadOptions {
		expected_rows: Some(240),
		..Default::default()
	};
	let table = from_csv_reader(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		&options,
	)
	.unwrap();
	let wrangle_options = WrangleOptions {
		max_cardinality: 100,
		..Default::default()
	};
	wrangle(table, &wrangle_options).unwrap()
}

#[test]
fn test_wrangling_keeps_only_usable_columns() {
	let table = load_and_wrangle();
	assert_eq!(
		table.records.column_names(),
		vec!["Facility Type", "Risk", "Latitude", "Longitude", "Fail"]
	);
	assert_eq!(table.nrows(), 240);
}

#[test]
fn test_full_workflow() {
	let table = load_and_wrangle();
	let (features, labels) = split_features_and_target(table, "Fail").unwrap();
	assert_eq!(labels.options, vec!["0".to_owned(), "1".to_owned()]);
	let cutoff = NaiveDate::from_ymd(2017, 1, 1);
	let split = split_by_date(&features, &labels, cutoff);
	assert_eq!(
		split.features_train.nrows() + split.features_val.nrows(),
		240
	);
	assert!(split.features_train.nrows() > 100);
	assert!(split.features_val.nrows() > 50);
	// Everything on the training side is dated before the cutoff.
	assert!(split.features_train.index.iter().all(|date| *date < cutoff));
	assert!(split.features_val.index.iter().all(|date| *date >= cutoff));
	let labels_train = label_ids(&split.labels_train).unwrap();
	let baseline = baseline_accuracy(&labels_train);
	assert!(baseline > 0.4 && baseline < 0.9);
	for config in &[PipelineConfig::bagging(), PipelineConfig::boosting()] {
		let pipeline = train(
			&split.features_train.records,
			&split.labels_train,
			config,
			&mut |_| {},
		)
		.unwrap();
		let output = evaluate(&pipeline, &split).unwrap();
		// The outcome is a deterministic function of the surviving columns, so a fitted model has to beat always guessing the majority class.
		assert!(
			output.accuracy_val > baseline,
			"validation accuracy {} did not beat the baseline {}",
			output.accuracy_val,
			baseline
		);
		assert!(output.auc_roc > 0.9, "auc was {}", output.auc_roc);
		assert_eq!(output.report.classes.len(), 2);
		assert_eq!(output.report.n_examples, split.features_val.nrows());
		let first = output.roc_curve.first().unwrap();
		assert_eq!(first.false_positive_rate, 0.0);
		let last = output.roc_curve.last().unwrap();
		assert_eq!(last.true_positive_rate, 1.0);
	}
}

#[test]
fn test_baseline_is_the_training_majority_frequency() {
	// Failures are rare before the cutoff and common after it, so the two sides of the split have opposite majority classes and the training baseline is the only valid reference.
	let mut csv = String::from("Inspection Date,Risk,Fail\n");
	for i in 0..20usize {
		let date = NaiveDate::from_ymd(2016, 1, 1) + chrono::Duration::days(i as i64);
		let fail = if i % 4 == 0 { 1 } else { 0 };
		writeln!(csv, "{},{},{}", date.format("%Y-%m-%d"), RISKS[i % 3], fail).unwrap();
	}
	for i in 0..20usize {
		let date = NaiveDate::from_ymd(2017, 6, 1) + chrono::Duration::days(i as i64);
		let fail = if i % 5 == 0 { 0 } else { 1 };
		writeln!(csv, "{},{},{}", date.format("%Y-%m-%d"), RISKS[i % 3], fail).unwrap();
	}
	let table = from_csv_reader(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		&LoadOptions::default(),
	)
	.unwrap();
	let (features, labels) = split_features_and_target(table, "Fail").unwrap();
	let split = split_by_date(&features, &labels, NaiveDate::from_ymd(2017, 1, 1));
	let labels_train = label_ids(&split.labels_train).unwrap();
	let labels_val = label_ids(&split.labels_val).unwrap();
	// 5 of the 20 training rows fail, 16 of the 20 validation rows fail.
	assert_eq!(labels_train.iter().sum::<usize>(), 5);
	assert_eq!(labels_val.iter().sum::<usize>(), 16);
	let baseline = baseline_accuracy(&labels_train);
	assert!(f32::abs(baseline - 0.75) < 1e-6);
	// The validation side's majority is the opposite class, so its frequency is not a substitute.
	assert!(f32::abs(baseline_accuracy(&labels_val) - 0.8) < 1e-6);
}

#[test]
fn test_permutation_importances_rank_the_real_signal() {
	let table = load_and_wrangle();
	let (features, labels) = split_features_and_target(table, "Fail").unwrap();
	let split = split_by_date(&features, &labels, NaiveDate::from_ymd(2017, 1, 1));
	let pipeline = train(
		&split.features_train.records,
		&split.labels_train,
		&PipelineConfig::boosting(),
		&mut |_| {},
	)
	.unwrap();
	let labels_val = label_ids(&split.labels_val).unwrap();
	let importances = compute_permutation_importances(
		&pipeline,
		&split.features_val.records,
		&labels_val,
		&PermutationImportanceOptions::default(),
	)
	.unwrap();
	// One row per surviving input column.
	let names: Vec<&str> = importances
		.iter()
		.map(|importance| importance.feature_name.as_str())
		.collect();
	assert_eq!(
		names,
		vec!["Facility Type", "Risk", "Latitude", "Longitude"]
	);
	let by_name = |name: &str| {
		importances
			.iter()
			.find(|importance| importance.feature_name == name)
			.unwrap()
			.mean_importance
	};
	// Risk drives the outcome, the coordinates do not.
	assert!(by_name("Risk") > 0.1);
	assert!(by_name("Risk") > by_name("Longitude"));
}

#[test]
fn test_partial_dependence_over_coordinates() {
	let table = load_and_wrangle();
	let (features, labels) = split_features_and_target(table, "Fail").unwrap();
	let pipeline = train(
		&features.records,
		&labels,
		&PipelineConfig::boosting(),
		&mut |_| {},
	)
	.unwrap();
	let surface = compute_partial_dependence(
		&pipeline,
		&features.records,
		"Latitude",
		"Longitude",
		&PartialDependenceOptions::default(),
	)
	.unwrap();
	assert_eq!(surface.feature_x, "Latitude");
	assert_eq!(surface.feature_y, "Longitude");
	assert!(!surface.x_values.is_empty());
	assert!(!surface.y_values.is_empty());
	for value in surface.values.iter() {
		assert!((0.0..=1.0).contains(value));
	}
}
