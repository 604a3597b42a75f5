/// The 13 finding categories, in model output order. Multi-label: each
/// condition is scored independently, none are mutually exclusive.
pub const CONDITIONS: [&str; 13] = [
    "Enlarged Cardiomediastinum",
    "Cardiomegaly",
    "Lung Opacity",
    "Lung Lesion",
    "Edema",
    "Consolidation",
    "Pneumonia",
    "Atelectasis",
    "Pneumothorax",
    "Pleural Effusion",
    "Pleural Other",
    "Fracture",
    "Support Devices",
];

/// Probability cutoff turning a continuous score into a "Y"/"N" label.
pub const DEFAULT_THRESHOLD: f32 = 0.3;
