pub mod shared {
    pub mod clock;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod region;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
        pub mod image_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_camera_source;
        pub mod image_file_writer;
    }
}

pub mod detection {
    pub mod domain {
        pub mod detection;
        pub mod object_detector;
        pub mod target_classes;
    }
    pub mod infrastructure;
}

pub mod recognition {
    pub mod domain {
        pub mod authorization_gate;
        pub mod face_embedding;
        pub mod face_encoder;
        pub mod face_locator;
        pub mod face_matcher;
        pub mod identity_gallery;
    }
    pub mod infrastructure;
}

pub mod alerting {
    pub mod domain {
        pub mod alert_policy;
        pub mod alert_sink;
        pub mod alert_sound;
    }
    pub mod infrastructure;
}

pub mod enrollment {
    pub mod enrollment_flow;
}

pub mod pipeline {
    pub mod monitor_use_case;
    pub mod pipeline_logger;
}
