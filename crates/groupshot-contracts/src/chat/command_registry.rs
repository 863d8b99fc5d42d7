#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "start",
        action: "begin",
    },
    CommandSpec {
        command: "next",
        action: "advance",
    },
    CommandSpec {
        command: "back",
        action: "back",
    },
    CommandSpec {
        command: "status",
        action: "status",
    },
    CommandSpec {
        command: "poses",
        action: "list_poses",
    },
    CommandSpec {
        command: "scenes",
        action: "list_scenes",
    },
    CommandSpec {
        command: "generate",
        action: "generate",
    },
    CommandSpec {
        command: "regenerate",
        action: "regenerate",
    },
    CommandSpec {
        command: "export",
        action: "export",
    },
    CommandSpec {
        command: "theme",
        action: "toggle_theme",
    },
    CommandSpec {
        command: "restart",
        action: "start_over",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
];

pub(crate) const SLOT_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "remove",
        action: "remove_image",
    },
    CommandSpec {
        command: "reference",
        action: "toggle_reference",
    },
];

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "pose",
        action: "select_pose",
    },
    CommandSpec {
        command: "scene",
        action: "set_scene",
    },
    CommandSpec {
        command: "ratio",
        action: "set_ratio",
    },
    CommandSpec {
        command: "goto",
        action: "goto_step",
    },
];

pub(crate) const TOGGLE_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "outfits",
        action: "set_outfits",
    },
    CommandSpec {
        command: "background",
        action: "set_background",
    },
];

pub(crate) const ADD_COMMAND: CommandSpec = CommandSpec {
    command: "add",
    action: "add_image",
};

pub(crate) const EDIT_COMMAND: CommandSpec = CommandSpec {
    command: "edit",
    action: "edit_image",
};

pub const WIZARD_HELP_COMMANDS: &[&str] = &[
    "/start",
    "/add",
    "/remove",
    "/reference",
    "/pose",
    "/poses",
    "/scene",
    "/scenes",
    "/ratio",
    "/outfits",
    "/background",
    "/next",
    "/back",
    "/goto",
    "/generate",
    "/regenerate",
    "/edit",
    "/export",
    "/status",
    "/theme",
    "/restart",
    "/help",
    "/quit",
];
