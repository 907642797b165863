//! Text snapshot of the ledger and the live graph.

use std::fmt::{self, Display};

use chrono::{DateTime, TimeZone};

use crate::ObjectStore;

// ctime(3) layout, minus the trailing newline
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Renders a snapshot taken at `at`.
pub fn render<Tz>(store: &ObjectStore, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Snapshot { store, at }.to_string()
}

/// Objects appear most recent first, each followed by its outgoing edges in
/// insertion order.
pub struct Snapshot<'a, Tz: TimeZone> {
    pub store: &'a ObjectStore,
    pub at: &'a DateTime<Tz>,
}

impl<Tz> Display for Snapshot<'_, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.store.ledger();

        writeln!(f, "===== HEAP SNAPSHOT =====")?;
        writeln!(f, "Timestamp: {}\n", self.at.format(TIMESTAMP_FORMAT))?;
        writeln!(f, "Total objects created: {}", ledger.objects_allocated())?;
        writeln!(f, "Total objects freed:   {}", ledger.objects_freed())?;
        writeln!(f, "Total memory allocated: {} bytes", ledger.bytes_allocated())?;
        writeln!(f, "Total memory freed:     {} bytes", ledger.bytes_freed())?;
        writeln!(f, "Current memory in use:  {} bytes\n", ledger.live_bytes())?;

        writeln!(f, "=== Objects in Heap ===")?;
        for (_, object) in self.store.iter() {
            writeln!(f, "Object: {} (ID: {})", object.name(), object.id())?;
            if object.refs().is_empty() {
                writeln!(f, "   No references")?;
            }
            for &target in object.refs() {
                if let Some(target) = self.store.get(target) {
                    writeln!(f, "   -> {}", target.name())?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "======= END OF SNAPSHOT =======")
    }
}
