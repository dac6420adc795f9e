quantity!(Hours, suffix: "h", precision: 1);
