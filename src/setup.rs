use bevy::prelude::*;

/// The viewer; placement requests resolve their gaze target from it.
#[derive(Component)]
pub struct MainCamera;

pub fn setup(mut commands: Commands) {
    // 1) Light
    commands.spawn((
        PointLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(0.0, 2.3, 0.0),
    ));

    // 2) Camera, standing inside the demo room looking across it
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-2.2, 1.6, 1.4).looking_at(Vec3::new(1.5, 0.4, -1.0), Vec3::Y),
        MainCamera,
    ));
}
