use crate::calendar::{Party, ScheduleRecord, ScheduleState, Slot, SlotState, Viewer};

/// Overlays remote schedule records on generated slots for one viewer.
///
/// Generation already decided which hours are bookable at all; remote data
/// can only turn an `Available` slot into something else, never the reverse.
/// The result is sorted by start time, which every calendar surface relies on.
pub fn reconcile(generated: Vec<Slot>, records: &[ScheduleRecord], viewer: &Viewer) -> Vec<Slot> {
    let mut slots: Vec<Slot> = generated
        .into_iter()
        .map(|slot| {
            if slot.state == SlotState::NotAvailable {
                return slot;
            }
            let state = match record_for(&slot, records) {
                Some(record) => state_for(record, viewer),
                None => SlotState::Available,
            };
            slot.with_state(state)
        })
        .collect();

    slots.sort_by_key(|slot| slot.start);
    slots
}

/// A live booking shadows any cancelled rows left behind at the same hour.
fn record_for<'a>(slot: &Slot, records: &'a [ScheduleRecord]) -> Option<&'a ScheduleRecord> {
    let mut matching = records.iter().filter(|r| r.starting_time == slot.start);
    let first = matching.next()?;
    if first.schedule_state == ScheduleState::Booked {
        return Some(first);
    }
    Some(
        matching
            .find(|r| r.schedule_state == ScheduleState::Booked)
            .unwrap_or(first),
    )
}

fn state_for(record: &ScheduleRecord, viewer: &Viewer) -> SlotState {
    match (record.schedule_state, viewer) {
        (ScheduleState::Booked, Viewer::Fixer) => SlotState::Booked,
        (ScheduleState::Booked, Viewer::Requester { requester_id }) => {
            if record.belongs_to(requester_id) {
                SlotState::Booked
            } else {
                SlotState::NotAvailable
            }
        }
        (ScheduleState::Cancelled, Viewer::Requester { requester_id })
            if record.belongs_to(requester_id) =>
        {
            match record.cancelled_by {
                Some(Party::Requester) => SlotState::CancelledByRequester,
                Some(Party::Fixer) => SlotState::CancelledByFixer,
                None => {
                    tracing::debug!(
                        "Cancelled record at {} has no attribution; showing as cancelled by fixer",
                        record.starting_time
                    );
                    SlotState::CancelledByFixer
                }
            }
        }
        (ScheduleState::Cancelled, _) => SlotState::Available,
    }
}
