use bevy::prelude::*;

mod placement;
mod room;
mod setup;

use placement::plugin::PlacementPlugin;
use room::plugin::RoomPlugin;

fn main() {
    App::new()
        // core engine plugins
        .add_plugins(DefaultPlugins)
        // domain plugins
        .add_plugins(RoomPlugin) // loads the scan capture + rebuilds geometry
        .add_plugins(PlacementPlugin) // catalog + pose searches + spawning
        // camera and light
        .add_systems(Startup, setup::setup)
        .run();
}
