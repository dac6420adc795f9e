quantity!(Kilograms, suffix: "kg", precision: 2);

// Emission intensity of grid energy.
quantity!(KilogramsPerKilowattHour, suffix: "kg/kWh", precision: 2);
