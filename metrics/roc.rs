/// This function computes the area under the receiver operating characteristic curve using the trapezoid method. Single class labels have no curve to integrate, so the area is reported as 0.0.
pub fn auc_roc(probabilities: &[f32], labels: &[usize]) -> f32 {
	let roc_curve = compute_roc_curve(probabilities, labels);
	if roc_curve.len() < 2 {
		return 0.0;
	}
	(0..roc_curve.len() - 1)
		.map(|i| {
			let left = &roc_curve[i];
			let right = &roc_curve[i + 1];
			let y_average = (left.true_positive_rate + right.true_positive_rate) / 2.0;
			let dx = right.false_positive_rate - left.false_positive_rate;
			y_average * dx
		})
		.sum()
}

#[derive(Debug, PartialEq)]
pub struct RocCurvePoint {
	/// The classification threshold.
	pub threshold: f32,
	/// The true positive rate for all predictions with probability >= threshold.
	pub true_positive_rate: f32,
	/// The false positive rate for all predictions with probability >= threshold.
	pub false_positive_rate: f32,
}

/**
This function computes the ROC curve for binary labels coded as 0 (negative) and 1 (positive). The curve plots the false positive rate on the x axis and the true positive rate on the y axis across all distinct probability thresholds, in order of descending threshold. It starts at (0, 0) with a dummy threshold of 1.0 and ends at (1, 1), and both rates are monotonically non-decreasing as the threshold decreases.

If the labels contain only one class then one of the rates has a zero denominator, so the curve is empty rather than a sequence of NaN points.
*/
pub fn compute_roc_curve(probabilities: &[f32], labels: &[usize]) -> Vec<RocCurvePoint> {
	let mut tps_fps = compute_tps_fps_by_threshold(probabilities, labels);
	for i in 1..tps_fps.len() {
		tps_fps[i].true_positives += tps_fps[i - 1].true_positives;
		tps_fps[i].false_positives += tps_fps[i - 1].false_positives;
	}
	let count_positives: usize = labels.iter().sum();
	let count_negatives = labels.len() - count_positives;
	if count_positives == 0 || count_negatives == 0 {
		return Vec::new();
	}
	// Add a point at (0, 0) on the roc curve with a dummy threshold of 1.0.
	let mut roc_curve = vec![RocCurvePoint {
		threshold: 1.0,
		true_positive_rate: 0.0,
		false_positive_rate: 0.0,
	}];
	for tps_fps_point in tps_fps.iter() {
		roc_curve.push(RocCurvePoint {
			threshold: tps_fps_point.threshold,
			true_positive_rate: tps_fps_point.true_positives as f32 / count_positives as f32,
			false_positive_rate: tps_fps_point.false_positives as f32 / count_negatives as f32,
		});
	}
	roc_curve
}

#[derive(Debug)]
struct TpsFpsPoint {
	/// The classification threshold.
	threshold: f32,
	/// The count of true positives at exactly this threshold.
	true_positives: usize,
	/// The count of false positives at exactly this threshold.
	false_positives: usize,
}

/// This function computes the counts of true positives and false positives at each distinct probability value, from the highest probability to the lowest. Unlike the roc curve, each point contains just the counts at that exact probability, not the cumulative counts.
fn compute_tps_fps_by_threshold(probabilities: &[f32], labels: &[usize]) -> Vec<TpsFpsPoint> {
	let mut probabilities_labels: Vec<(f32, usize)> = probabilities
		.iter()
		.zip(labels.iter())
		.map(|(probability, label)| (*probability, *label))
		.collect();
	probabilities_labels.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
	let mut tps_fps: Vec<TpsFpsPoint> = Vec::new();
	for (probability, label) in probabilities_labels.iter() {
		let tp = *label;
		match tps_fps.last_mut() {
			// If the probability is the same as the last one, add to the previous bucket.
			Some(last_point)
				if probability.partial_cmp(&last_point.threshold).unwrap()
					== std::cmp::Ordering::Equal =>
			{
				last_point.true_positives += tp;
				last_point.false_positives += 1 - tp;
			}
			_ => {
				tps_fps.push(TpsFpsPoint {
					threshold: *probability,
					true_positives: tp,
					false_positives: 1 - tp,
				});
			}
		}
	}
	tps_fps
}
