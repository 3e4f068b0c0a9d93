//! This module contains the main entrypoint to the failcast cli.

use anyhow::{format_err, Result};
use chrono::NaiveDate;
use clap::Clap;
use colored::Colorize;
use failcast_core::{
	baseline_accuracy, compute_partial_dependence, compute_permutation_importances, evaluate,
	label_ids, load_dated_csv, split_by_date, split_features_and_target, train, wrangle,
	DateSplit, EvaluateOutput, LoadOptions, PartialDependenceOptions, PermutationImportance,
	PermutationImportanceOptions, PipelineConfig, TrainProgress, TrainedPipeline,
	WrangleOptions,
};
use failcast_util::Table;
use std::path::PathBuf;

#[derive(Clap)]
#[clap(
	about = "Predict failed food inspections from a dated csv.",
	setting = clap::AppSettings::DisableHelpSubcommand,
)]
struct Options {
	#[clap(about = "the path to your .csv file")]
	file: PathBuf,
	#[clap(short, long, about = "the name of the column to predict", default_value = "Fail")]
	target: String,
	#[clap(
		long,
		about = "rows dated before this day train the models, the rest validate them",
		default_value = "2017-01-01"
	)]
	cutoff: NaiveDate,
	#[clap(long, about = "the name of the date column", default_value = "Inspection Date")]
	date_column: String,
	#[clap(long, about = "fail unless the csv has exactly this many rows")]
	expected_rows: Option<usize>,
	#[clap(
		long,
		about = "drop columns with more distinct values than this",
		default_value = "500"
	)]
	max_cardinality: usize,
	#[clap(
		long,
		about = "a number column to sweep for the partial dependence surface",
		requires = "partial-dependence-y"
	)]
	partial_dependence_x: Option<String>,
	#[clap(
		long,
		about = "the second number column of the partial dependence surface",
		requires = "partial-dependence-x"
	)]
	partial_dependence_y: Option<String>,
	#[clap(long, about = "print the results as json instead of text")]
	json: bool,
	#[clap(long = "no-progress", about = "disable progress output", parse(from_flag = std::ops::Not::not))]
	progress: bool,
}

fn main() {
	let options = Options::parse();
	if let Err(error) = cli_run(options) {
		eprintln!("{}: {}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

struct ModelReport {
	name: &'static str,
	evaluation: EvaluateOutput,
	importances: Vec<PermutationImportance>,
}

fn cli_run(options: Options) -> Result<()> {
	let load_options = LoadOptions {
		date_column: options.date_column.clone(),
		expected_rows: options.expected_rows,
		max_enum_options: options.max_cardinality,
	};
	let table = load_dated_csv(&options.file, &load_options)?;
	let wrangle_options = WrangleOptions {
		max_cardinality: options.max_cardinality,
		..Default::default()
	};
	let table = wrangle(table, &wrangle_options)?;
	let (features, labels) = split_features_and_target(table, &options.target)?;
	let split = split_by_date(&features, &labels, options.cutoff);
	if split.features_train.nrows() == 0 {
		return Err(format_err!(
			"no rows are dated before the cutoff {}, so there is nothing to train on",
			options.cutoff
		));
	}
	if split.features_val.nrows() == 0 {
		return Err(format_err!(
			"no rows are dated on or after the cutoff {}, so there is nothing to validate on",
			options.cutoff
		));
	}
	let labels_train = label_ids(&split.labels_train)?;
	let labels_val = label_ids(&split.labels_val)?;
	// The baseline is the majority class frequency of the training target, the number a model must beat on validation.
	let baseline = baseline_accuracy(&labels_train);
	let configs = [
		("bagging", PipelineConfig::bagging()),
		("boosting", PipelineConfig::boosting()),
	];
	let mut reports = Vec::new();
	let mut last_pipeline = None;
	for &(name, ref config) in configs.iter() {
		let pipeline = train_with_progress(&split, config, name, options.progress)?;
		let evaluation = evaluate(&pipeline, &split)?;
		let importances = compute_permutation_importances(
			&pipeline,
			&split.features_val.records,
			&labels_val,
			&PermutationImportanceOptions::default(),
		)?;
		reports.push(ModelReport {
			name,
			evaluation,
			importances,
		});
		last_pipeline = Some(pipeline);
	}
	let surface = match (&options.partial_dependence_x, &options.partial_dependence_y) {
		(Some(feature_x), Some(feature_y)) => Some(compute_partial_dependence(
			last_pipeline.as_ref().unwrap(),
			&split.features_val.records,
			feature_x,
			feature_y,
			&PartialDependenceOptions::default(),
		)?),
		_ => None,
	};
	if options.json {
		print_json(baseline, &reports, &split, surface.as_ref())?;
	} else {
		print_text(baseline, &reports, &split, surface.as_ref());
	}
	Ok(())
}

fn train_with_progress(
	split: &DateSplit,
	config: &PipelineConfig,
	name: &str,
	progress: bool,
) -> Result<TrainedPipeline> {
	train(
		&split.features_train.records,
		&split.labels_train,
		config,
		&mut |train_progress| {
			if progress {
				match train_progress {
					TrainProgress::ComputingFeatures(counter) => {
						eprintln!("{}: computing {} feature values", name, counter.total())
					}
					TrainProgress::TrainingModel(counter) => {
						eprintln!("{}: training {} trees", name, counter.total())
					}
				}
			}
		},
	)
}

fn print_text(
	baseline: f32,
	reports: &[ModelReport],
	split: &DateSplit,
	surface: Option<&failcast_core::PartialDependenceSurface>,
) {
	println!(
		"{} training rows, {} validation rows",
		split.features_train.nrows(),
		split.features_val.nrows()
	);
	println!("baseline accuracy: {:.4}", baseline);
	for report in reports.iter() {
		println!();
		println!("=== {} ===", report.name);
		println!("train accuracy: {:.4}", report.evaluation.accuracy_train);
		println!("validation accuracy: {:.4}", report.evaluation.accuracy_val);
		println!("auc: {:.4}", report.evaluation.auc_roc);
		println!();
		println!("{}", report.evaluation.report);
		let mut table = Table::new(vec![
			"feature".to_owned(),
			"importance".to_owned(),
			"std".to_owned(),
		]);
		for importance in report.importances.iter() {
			table.add_row(vec![
				importance.feature_name.clone(),
				format!("{:.4}", importance.mean_importance),
				format!("{:.4}", importance.std_importance),
			]);
		}
		println!("{}", table);
	}
	if let Some(surface) = surface {
		println!();
		println!(
			"partial dependence of {} and {}",
			surface.feature_x, surface.feature_y
		);
		let mut header = vec![format!("{} \\ {}", surface.feature_x, surface.feature_y)];
		header.extend(surface.y_values.iter().map(|y| format!("{:.3}", y)));
		let mut table = Table::new(header);
		for (i, x) in surface.x_values.iter().enumerate() {
			let mut row = vec![format!("{:.3}", x)];
			row.extend(
				surface
					.values
					.row(i)
					.iter()
					.map(|value| format!("{:.3}", value)),
			);
			table.add_row(row);
		}
		println!("{}", table);
	}
}

fn print_json(
	baseline: f32,
	reports: &[ModelReport],
	split: &DateSplit,
	surface: Option<&failcast_core::PartialDependenceSurface>,
) -> Result<()> {
	let models: Vec<serde_json::Value> = reports
		.iter()
		.map(|report| {
			serde_json::json!({
				"name": report.name,
				"accuracy_train": report.evaluation.accuracy_train,
				"accuracy_val": report.evaluation.accuracy_val,
				"auc_roc": report.evaluation.auc_roc,
				"roc_curve": report
					.evaluation
					.roc_curve
					.iter()
					.map(|point| {
						serde_json::json!({
							"threshold": point.threshold,
							"true_positive_rate": point.true_positive_rate,
							"false_positive_rate": point.false_positive_rate,
						})
					})
					.collect::<Vec<_>>(),
				"permutation_importances": report
					.importances
					.iter()
					.map(|importance| {
						serde_json::json!({
							"feature": importance.feature_name,
							"mean": importance.mean_importance,
							"std": importance.std_importance,
						})
					})
					.collect::<Vec<_>>(),
			})
		})
		.collect();
	let mut output = serde_json::json!({
		"n_train": split.features_train.nrows(),
		"n_val": split.features_val.nrows(),
		"baseline_accuracy": baseline,
		"models": models,
	});
	if let Some(surface) = surface {
		output["partial_dependence"] = serde_json::json!({
			"feature_x": surface.feature_x,
			"feature_y": surface.feature_y,
			"x_values": surface.x_values,
			"y_values": surface.y_values,
			"values": surface
				.values
				.outer_iter()
				.map(|row| row.to_vec())
				.collect::<Vec<_>>(),
		});
	}
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}
