use super::{ChartValues, Extraction, PatientRecord};
use crate::extract::TextFields;

/// Combine text fields and chart values into one subject-independent result.
pub fn build_extraction(text: TextFields, charts: ChartValues) -> Extraction {
    Extraction {
        demographics: text.demographics,
        spatio_temporal: text.spatio_temporal,
        charts,
    }
}

/// Attach the caller-supplied subject identifier to an extraction.
///
/// Every group of the returned record is keyed by the same `subject_id`.
pub fn assemble(subject_id: &str, extraction: Extraction) -> PatientRecord {
    let Extraction {
        demographics,
        spatio_temporal,
        charts,
    } = extraction;

    PatientRecord {
        subject_id: subject_id.to_string(),
        patient: demographics,
        spatio_temporal,
        kinematics: charts.kinematics,
        dynamics: charts.dynamics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layout::{DynamicVariable, KinematicVariable};
    use crate::record::Sex;

    #[test]
    fn test_assemble_keeps_every_group() {
        let text = TextFields::from_corpus("Height : 1.70m\nWeight : 65Kg\nSex : Female\n");
        let mut charts = ChartValues::default();
        charts.kinematics.set(KinematicVariable::HipLeft, Some(100.0));
        charts.dynamics.set(DynamicVariable::KneeMoment, Some(1.2));

        let record = assemble("S042", build_extraction(text, charts));

        assert_eq!(record.subject_id, "S042");
        assert_eq!(record.patient.height, Some(1.70));
        assert_eq!(record.patient.weight, Some(65.0));
        assert_eq!(record.patient.sex, Some(Sex::F));
        assert_eq!(record.patient.age, None);
        assert_eq!(record.kinematics.get(KinematicVariable::HipLeft), Some(100.0));
        assert_eq!(record.kinematics.get(KinematicVariable::HipRight), None);
        assert_eq!(record.dynamics.get(DynamicVariable::KneeMoment), Some(1.2));
    }

    #[test]
    fn test_record_json_shape() {
        let record = assemble("S1", Extraction::default());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ID_Sujet"], "S1");
        assert!(json["patient"]["Sexe"].is_null());
        assert!(json["kinematics"]["ROM_Hanche_Gauche"].is_null());
    }
}
