// Phase 6: 出力レコード（4テーブル分のグループ）

pub mod assembler;

use serde::{Deserialize, Serialize};

use crate::config::layout::{DynamicVariable, KinematicVariable};

/// Sex code stored in the `patients` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    /// Homme
    H,
    /// Femme
    F,
}

impl Sex {
    /// Map the report's English label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Male" => Some(Sex::H),
            "Female" => Some(Sex::F),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::H => "H",
            Sex::F => "F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "H" => Some(Sex::H),
            "F" => Some(Sex::F),
            _ => None,
        }
    }
}

/// `patients` columns other than the identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(rename = "Age")]
    pub age: Option<i32>,
    #[serde(rename = "Sexe")]
    pub sex: Option<Sex>,
    /// Metres.
    #[serde(rename = "Taille")]
    pub height: Option<f64>,
    /// Kilograms.
    #[serde(rename = "Poids")]
    pub weight: Option<f64>,
}

/// `parametres_spatio_temporels` columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatioTemporal {
    #[serde(rename = "Vitesse")]
    pub speed: Option<f64>,
    #[serde(rename = "Step_Length_Gauche")]
    pub step_length_left: Option<f64>,
    #[serde(rename = "Step_Length_Droite")]
    pub step_length_right: Option<f64>,
    #[serde(rename = "Cycle_Time_Gauche")]
    pub cycle_time_left: Option<f64>,
    #[serde(rename = "Cycle_Time_Droite")]
    pub cycle_time_right: Option<f64>,
    #[serde(rename = "Steps_per_min_Gauche")]
    pub steps_per_min_left: Option<f64>,
    #[serde(rename = "Steps_per_min_Droite")]
    pub steps_per_min_right: Option<f64>,
    #[serde(rename = "Double_Support_Time")]
    pub double_support_time: Option<f64>,
}

impl SpatioTemporal {
    /// Column names paired with their values, in table order.
    pub fn columns(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("Vitesse", self.speed),
            ("Step_Length_Gauche", self.step_length_left),
            ("Step_Length_Droite", self.step_length_right),
            ("Cycle_Time_Gauche", self.cycle_time_left),
            ("Cycle_Time_Droite", self.cycle_time_right),
            ("Steps_per_min_Gauche", self.steps_per_min_left),
            ("Steps_per_min_Droite", self.steps_per_min_right),
            ("Double_Support_Time", self.double_support_time),
        ]
    }
}

/// `parametres_cinematiques` columns: range of motion in degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    #[serde(rename = "ROM_Hanche_Gauche")]
    pub hip_left: Option<f64>,
    #[serde(rename = "ROM_Hanche_Droite")]
    pub hip_right: Option<f64>,
    #[serde(rename = "ROM_Genou_Gauche")]
    pub knee_left: Option<f64>,
    #[serde(rename = "ROM_Genou_Droite")]
    pub knee_right: Option<f64>,
    #[serde(rename = "ROM_Cheville_Gauche")]
    pub ankle_left: Option<f64>,
    #[serde(rename = "ROM_Cheville_Droite")]
    pub ankle_right: Option<f64>,
    #[serde(rename = "Foot_Progression_Gauche")]
    pub foot_progression_left: Option<f64>,
    #[serde(rename = "Foot_Progression_Droite")]
    pub foot_progression_right: Option<f64>,
}

impl Kinematics {
    fn slot(&mut self, var: KinematicVariable) -> &mut Option<f64> {
        match var {
            KinematicVariable::HipLeft => &mut self.hip_left,
            KinematicVariable::HipRight => &mut self.hip_right,
            KinematicVariable::KneeLeft => &mut self.knee_left,
            KinematicVariable::KneeRight => &mut self.knee_right,
            KinematicVariable::AnkleLeft => &mut self.ankle_left,
            KinematicVariable::AnkleRight => &mut self.ankle_right,
            KinematicVariable::FootProgressionLeft => &mut self.foot_progression_left,
            KinematicVariable::FootProgressionRight => &mut self.foot_progression_right,
        }
    }

    pub fn get(&self, var: KinematicVariable) -> Option<f64> {
        match var {
            KinematicVariable::HipLeft => self.hip_left,
            KinematicVariable::HipRight => self.hip_right,
            KinematicVariable::KneeLeft => self.knee_left,
            KinematicVariable::KneeRight => self.knee_right,
            KinematicVariable::AnkleLeft => self.ankle_left,
            KinematicVariable::AnkleRight => self.ankle_right,
            KinematicVariable::FootProgressionLeft => self.foot_progression_left,
            KinematicVariable::FootProgressionRight => self.foot_progression_right,
        }
    }

    pub fn set(&mut self, var: KinematicVariable, value: Option<f64>) {
        *self.slot(var) = value.filter(|v| v.is_finite());
    }
}

/// `parametres_dynamiques` columns: calibrated curve peaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dynamics {
    #[serde(rename = "Peak_Force_Verticale")]
    pub vertical_force: Option<f64>,
    #[serde(rename = "Peak_Power_Knee")]
    pub knee_power: Option<f64>,
    #[serde(rename = "Peak_Power_Ankle")]
    pub ankle_power: Option<f64>,
    #[serde(rename = "Peak_Moment_Hip")]
    pub hip_moment: Option<f64>,
    #[serde(rename = "Peak_Moment_Knee")]
    pub knee_moment: Option<f64>,
    #[serde(rename = "Peak_Moment_Ankle")]
    pub ankle_moment: Option<f64>,
}

impl Dynamics {
    fn slot(&mut self, var: DynamicVariable) -> &mut Option<f64> {
        match var {
            DynamicVariable::VerticalForce => &mut self.vertical_force,
            DynamicVariable::KneePower => &mut self.knee_power,
            DynamicVariable::AnklePower => &mut self.ankle_power,
            DynamicVariable::HipMoment => &mut self.hip_moment,
            DynamicVariable::KneeMoment => &mut self.knee_moment,
            DynamicVariable::AnkleMoment => &mut self.ankle_moment,
        }
    }

    pub fn get(&self, var: DynamicVariable) -> Option<f64> {
        match var {
            DynamicVariable::VerticalForce => self.vertical_force,
            DynamicVariable::KneePower => self.knee_power,
            DynamicVariable::AnklePower => self.ankle_power,
            DynamicVariable::HipMoment => self.hip_moment,
            DynamicVariable::KneeMoment => self.knee_moment,
            DynamicVariable::AnkleMoment => self.ankle_moment,
        }
    }

    pub fn set(&mut self, var: DynamicVariable, value: Option<f64>) {
        *self.slot(var) = value.filter(|v| v.is_finite());
    }
}

/// Everything recovered from the charts of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartValues {
    pub kinematics: Kinematics,
    pub dynamics: Dynamics,
}

/// Subject-independent extraction result of one document.
///
/// This is the unit stored in the result cache: the same PDF extracted with
/// the same settings always yields the same `Extraction`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub demographics: Demographics,
    pub spatio_temporal: SpatioTemporal,
    pub charts: ChartValues,
}

/// The assembled output for one subject, ready for a [`RecordSink`].
///
/// [`RecordSink`]: crate::store::RecordSink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "ID_Sujet")]
    pub subject_id: String,
    pub patient: Demographics,
    pub spatio_temporal: SpatioTemporal,
    pub kinematics: Kinematics,
    pub dynamics: Dynamics,
}
