use std::collections::HashMap;

/// Anything carrying a database identity.
pub trait Identified {
    fn id(&self) -> i64;
}

/// A reference id with no matching record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingRecord(pub i64);

impl std::fmt::Display for MissingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no record for referenced id {}", self.0)
    }
}

/// Arrange `records` so the i-th output has the id of the i-th element of
/// `reference`. Records not named by `reference` are dropped. Reference ids
/// are expected to be unique.
pub fn reorder_by_reference<R, T>(reference: &[R], records: Vec<T>) -> Result<Vec<T>, MissingRecord>
where
    R: Identified,
    T: Identified,
{
    let mut by_id: HashMap<i64, T> = records.into_iter().map(|r| (r.id(), r)).collect();

    reference
        .iter()
        .map(|r| by_id.remove(&r.id()).ok_or(MissingRecord(r.id())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(i64, &'static str);

    impl Identified for Row {
        fn id(&self) -> i64 {
            self.0
        }
    }

    impl Identified for i64 {
        fn id(&self) -> i64 {
            *self
        }
    }

    #[test]
    fn output_follows_reference_order() {
        let reference = [3_i64, 1, 2];
        let records = vec![Row(1, "a"), Row(2, "b"), Row(3, "c")];

        let ordered = reorder_by_reference(&reference, records).unwrap();
        assert_eq!(ordered, vec![Row(3, "c"), Row(1, "a"), Row(2, "b")]);
        for (r, o) in reference.iter().zip(&ordered) {
            assert_eq!(*r, o.id());
        }
    }

    #[test]
    fn missing_record_is_an_error() {
        let reference = [1_i64, 4];
        let records = vec![Row(1, "a")];
        assert_eq!(
            reorder_by_reference(&reference, records),
            Err(MissingRecord(4))
        );
    }

    #[test]
    fn records_outside_reference_are_dropped() {
        let reference = [2_i64];
        let records = vec![Row(1, "a"), Row(2, "b")];
        assert_eq!(
            reorder_by_reference(&reference, records).unwrap(),
            vec![Row(2, "b")]
        );
    }

    #[test]
    fn empty_reference_yields_empty_output() {
        let reference: [i64; 0] = [];
        assert!(reorder_by_reference(&reference, vec![Row(1, "a")]).unwrap().is_empty());
    }
}
