//! Default campus seed data.
//!
//! The engine ships with the CSUF campus building set the system was
//! observed running with. Seeded locations start accessible; locations
//! created later through the create operating mode start closed.

use crate::coord::GeoPoint;

/// A named point used to seed the location registry.
#[derive(Debug, Clone, Copy)]
pub struct SeedLocation {
    pub name: &'static str,
    pub position: GeoPoint,
}

const fn seed(name: &'static str, latitude: f64, longitude: f64) -> SeedLocation {
    SeedLocation {
        name,
        position: GeoPoint {
            latitude,
            longitude,
        },
    }
}

/// Campus buildings seeded at engine construction.
pub const CAMPUS_SEED: [SeedLocation; 14] = [
    seed("Humanities", 33.880421, -117.884185),
    seed("McCarthy Hall", 33.879662, -117.885496),
    seed("Computer Science", 33.882372, -117.882634),
    seed("Engineering", 33.882263, -117.883194),
    seed("Education", 33.881243, -117.884358),
    seed("Kinesiology", 33.882819, -117.885543),
    seed("Pollak Library", 33.881555, -117.885201),
    seed("Gordon Hall", 33.879757, -117.884189),
    seed("Visual Arts", 33.880692, -117.889134),
    seed("Langsdorf Hall", 33.878932, -117.884650),
    seed("Dan Black Hall", 33.879245, -117.885131),
    seed("Mihaylo Hall", 33.878732, -117.883978),
    seed("College Park", 33.877551, -117.883413),
    seed("Clayes Performing Arts Center", 33.880112, -117.886937),
];
