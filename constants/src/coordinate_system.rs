/// Mean Earth radius used by the equirectangular approximation (metres).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// East-North-Up to world axis mapping (row-major: [x_world, y_world, z_world]).
/// World convention: +X right (east at heading 0), +Y up, forward is -Z (north at heading 0).
pub const ENU_TO_WORLD: [[f64; 3]; 3] = [
    [1.0, 0.0, 0.0],  // X = East
    [0.0, 0.0, 1.0],  // Y = Up
    [0.0, -1.0, 0.0], // Z = -North
];

/// Apply the ENU to world mapping.
pub fn enu_to_world(east: f64, north: f64, up: f64) -> (f64, f64, f64) {
    let input = [east, north, up];
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += ENU_TO_WORLD[i][j] * input[j];
        }
    }

    (output[0], output[1], output[2])
}

/// Distances below this are treated as coincident points (metres).
pub const COINCIDENT_DISTANCE_M: f64 = 1e-6;
