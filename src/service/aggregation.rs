use crate::model::{db::PicnicRow, models::PicnicDetailType};

/**
 * Groups picnic listing rows into one record per picnic.
 *
 * Rows belonging to the same picnic must be contiguous, which the listing query
 * guarantees by ordering on the picnic id. Records are returned in first-seen
 * order and users in arrival order. Rows without a user id come from picnics
 * with no registrations and contribute no user, so such picnics get an empty
 * user list. Time and city of a record are taken from the last row of its group.
 *
 * # Arguments
 * `rows`: The joined rows, grouped by picnic id.
 *
 * # Returns
 * The aggregated picnics.
 */
pub fn picnic_rows_to_list(rows: &[PicnicRow]) -> Vec<PicnicDetailType> {
    let mut result: Vec<PicnicDetailType> = Vec::new();
    let mut user_buffer: Vec<i64> = Vec::new();
    let mut previous_row: Option<&PicnicRow> = None;

    for row in rows {
        if let Some(previous) = previous_row.filter(|previous| previous.picnic_id != row.picnic_id) {
            result.push(flush(previous, std::mem::take(&mut user_buffer)));
        }
        if let Some(user_id) = row.user_id {
            user_buffer.push(user_id);
        }
        previous_row = Some(row);
    }
    if let Some(last) = previous_row {
        result.push(flush(last, user_buffer));
    }
    result
}

fn flush(row: &PicnicRow, users: Vec<i64>) -> PicnicDetailType {
    PicnicDetailType { id: row.picnic_id, city: row.city_name.clone(), time: row.time, users }
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn row(picnic_id: i64, time: DateTime<Utc>, user_id: Option<i64>, city_name: &str) -> PicnicRow {
        PicnicRow { picnic_id, time, user_id, city_name: Some(city_name.to_string()) }
    }

    fn time(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(picnic_rows_to_list(&[]).is_empty());
    }

    #[test]
    fn test_single_row() {
        let result = picnic_rows_to_list(&[row(1, time(12), Some(7), "Paris")]);
        assert_eq!(result, vec![PicnicDetailType { id: 1, city: Some("Paris".to_string()), time: time(12), users: vec![7] }]);
    }

    #[test]
    fn test_two_groups() {
        let rows = vec![row(1, time(12), Some(1), "Paris"), row(1, time(12), Some(2), "Paris"), row(2, time(15), Some(3), "Rome")];
        let result = picnic_rows_to_list(&rows);
        assert_eq!(
            result,
            vec![
                PicnicDetailType { id: 1, city: Some("Paris".to_string()), time: time(12), users: vec![1, 2] },
                PicnicDetailType { id: 2, city: Some("Rome".to_string()), time: time(15), users: vec![3] },
            ]
        );
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_picnic_without_registrations_has_no_users() {
        let rows = vec![row(1, time(12), None, "Paris"), row(2, time(13), Some(4), "Rome"), row(3, time(14), None, "Oslo")];
        let result = picnic_rows_to_list(&rows);
        assert_eq!(result.len(), 3);
        assert!(result[0].users.is_empty());
        assert_eq!(result[1].users, vec![4]);
        assert!(result[2].users.is_empty());
    }

    #[test]
    fn test_missing_city_is_kept() {
        let rows = vec![PicnicRow { picnic_id: 5, time: time(9), user_id: Some(1), city_name: None }];
        let result = picnic_rows_to_list(&rows);
        assert_eq!(result[0].city, None);
    }

    #[test]
    fn test_first_seen_order_and_duplicates_kept() {
        let rows = vec![row(9, time(1), Some(2), "Rome"), row(9, time(1), Some(2), "Rome"), row(3, time(2), Some(1), "Paris")];
        let result = picnic_rows_to_list(&rows);
        assert_eq!(result.iter().map(|picnic| picnic.id).collect::<Vec<_>>(), vec![9, 3]);
        assert_eq!(result[0].users, vec![2, 2]);
    }

    #[test]
    fn test_restartable() {
        let rows = vec![row(1, time(12), Some(1), "Paris")];
        assert_eq!(picnic_rows_to_list(&rows), picnic_rows_to_list(&rows));
    }
}
